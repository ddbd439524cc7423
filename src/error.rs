use thiserror::Error;

/// Errors surfaced by the pull, store, and analytics paths.
///
/// Per-entry parse failures inside a provider response never become an
/// `AppError`; the normalizer drops the entry instead.
#[derive(Debug, Error)]
pub enum AppError {
    /// Required credential or setting is missing or malformed.
    #[error("configuration error: {0}")]
    Config(String),

    /// Transport-level failure talking to the market-data provider.
    #[error("feed unavailable: {0}")]
    FeedUnavailable(String),

    /// Analytics requested against an empty store.
    #[error("no data: {0}")]
    NoData(String),

    /// The observation store could not be read or written.
    #[error("store error: {0}")]
    Store(String),

    /// A report or export could not be produced.
    #[error("output error: {0}")]
    Output(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("terminal error: {0}")]
    Terminal(String),
}

impl AppError {
    /// Process exit code for this error.
    ///
    /// `NoData` maps to 0: the caller prints guidance and exits cleanly.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::NoData(_) => 0,
            AppError::Output(_) => 1,
            AppError::Config(_) => 2,
            AppError::Store(_) | AppError::Io(_) => 3,
            AppError::FeedUnavailable(_) | AppError::Terminal(_) => 4,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, AppError::NoData(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind() {
        let err = AppError::FeedUnavailable("timeout".into());
        assert_eq!(err.to_string(), "feed unavailable: timeout");
    }

    #[test]
    fn no_data_exits_cleanly() {
        let err = AppError::NoData("store is empty".into());
        assert!(err.is_no_data());
        assert_eq!(err.exit_code(), 0);
        assert_eq!(AppError::Config("x".into()).exit_code(), 2);
    }

    #[test]
    fn output_failures_are_not_store_failures() {
        let err = AppError::Output("Failed to serialize summary".into());
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().starts_with("output error"));
    }

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: AppError = io_err.into();
        assert_eq!(err.exit_code(), 3);
        assert!(err.to_string().contains("io error"));
    }
}
