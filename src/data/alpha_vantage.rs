//! Alpha Vantage API integration for the three tracked indicators.

use chrono::NaiveDate;
use reqwest::blocking::Client;
use serde_json::Value;
use tracing::debug;

use crate::config::AppConfig;
use crate::data::MarketDataFeed;
use crate::data::normalize::{FeedShape, normalize};
use crate::domain::{FetchMode, NormalizedFeed, Series};
use crate::error::AppError;

const EQUITY_SYMBOL: &str = "SPY";

const FX_POINT: FeedShape = FeedShape::Point {
    root: "Realtime Currency Exchange Rate",
    field: "5. Exchange Rate",
};
const FX_SERIES: FeedShape = FeedShape::Series {
    root: "Time Series FX (Daily)",
    field: "4. close",
};
const EQUITY_SERIES: FeedShape = FeedShape::Series {
    root: "Time Series (Daily)",
    field: "4. close",
};
const YIELD_RECORDS: FeedShape = FeedShape::Records {
    root: "data",
    date_field: "date",
    value_field: "value",
};

/// Query parameters plus the shape the answer comes back in.
#[derive(Debug, Clone, PartialEq)]
struct ProviderRequest {
    params: Vec<(&'static str, &'static str)>,
    shape: FeedShape,
}

fn request_for(series: Series, mode: FetchMode) -> ProviderRequest {
    let daily = matches!(mode, FetchMode::Daily { .. });
    match series {
        Series::EurUsd if daily => ProviderRequest {
            params: vec![
                ("function", "CURRENCY_EXCHANGE_RATE"),
                ("from_currency", "EUR"),
                ("to_currency", "USD"),
            ],
            shape: FX_POINT,
        },
        Series::EurUsd => ProviderRequest {
            params: vec![
                ("function", "FX_DAILY"),
                ("from_symbol", "EUR"),
                ("to_symbol", "USD"),
                ("outputsize", "full"),
            ],
            shape: FX_SERIES,
        },
        Series::Sp500 if daily => ProviderRequest {
            params: vec![
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", EQUITY_SYMBOL),
                ("outputsize", "compact"),
            ],
            shape: EQUITY_SERIES,
        },
        Series::Sp500 => ProviderRequest {
            params: vec![
                ("function", "TIME_SERIES_DAILY_ADJUSTED"),
                ("symbol", EQUITY_SYMBOL),
                ("outputsize", "full"),
            ],
            shape: EQUITY_SERIES,
        },
        Series::Treasury10y => ProviderRequest {
            params: vec![
                ("function", "TREASURY_YIELD"),
                ("interval", "daily"),
                ("maturity", "10year"),
            ],
            shape: YIELD_RECORDS,
        },
    }
}

pub struct AlphaVantageClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl AlphaVantageClient {
    /// Build a client from config. Fails with `AppError::Config` when no API key is set.
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        let api_key = config.require_api_key()?.to_string();
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key,
        })
    }

    fn pull(&self, series: Series, mode: FetchMode) -> Result<NormalizedFeed, AppError> {
        let request = request_for(series, mode);
        let body = self.get_json(&request.params)?;
        let feed = normalize(request.shape, &body, mode);
        debug!(series = series.column(), observations = feed.len(), "normalized response");
        Ok(feed)
    }

    fn get_json(&self, params: &[(&str, &str)]) -> Result<Value, AppError> {
        debug!(?params, "requesting {}", self.base_url);
        let resp = self
            .client
            .get(&self.base_url)
            .query(params)
            .query(&[("apikey", self.api_key.as_str())])
            .send()
            .map_err(|e| AppError::FeedUnavailable(format!("Alpha Vantage request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::FeedUnavailable(format!(
                "Alpha Vantage request failed with status {}.",
                resp.status()
            )));
        }

        resp.json::<Value>()
            .map_err(|e| AppError::FeedUnavailable(format!("Failed to parse Alpha Vantage response: {e}")))
    }
}

impl MarketDataFeed for AlphaVantageClient {
    fn fetch_point(&self, series: Series, today: NaiveDate) -> Result<NormalizedFeed, AppError> {
        self.pull(series, FetchMode::Daily { today })
    }

    fn fetch_series(&self, series: Series, mode: FetchMode) -> Result<NormalizedFeed, AppError> {
        self.pull(series, mode)
    }

    fn fetch_list_series(&self, series: Series, mode: FetchMode) -> Result<NormalizedFeed, AppError> {
        self.pull(series, mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn function_of(req: &ProviderRequest) -> &'static str {
        req.params
            .iter()
            .find(|(k, _)| *k == "function")
            .map(|(_, v)| *v)
            .unwrap()
    }

    #[test]
    fn daily_and_historical_requests_differ_per_series() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let since = NaiveDate::from_ymd_opt(2001, 1, 1).unwrap();
        let daily = FetchMode::Daily { today };
        let hist = FetchMode::Historical { since };

        assert_eq!(function_of(&request_for(Series::EurUsd, daily)), "CURRENCY_EXCHANGE_RATE");
        assert_eq!(request_for(Series::EurUsd, daily).shape, FX_POINT);
        assert_eq!(function_of(&request_for(Series::EurUsd, hist)), "FX_DAILY");
        assert_eq!(function_of(&request_for(Series::Sp500, daily)), "TIME_SERIES_DAILY");
        assert_eq!(function_of(&request_for(Series::Sp500, hist)), "TIME_SERIES_DAILY_ADJUSTED");
        assert_eq!(request_for(Series::Treasury10y, daily), request_for(Series::Treasury10y, hist));
    }

    #[test]
    fn client_requires_api_key() {
        let config = AppConfig::for_store("unused.json");
        let err = AlphaVantageClient::new(&config).err().unwrap();
        assert!(matches!(err, AppError::Config(_)));
    }
}
