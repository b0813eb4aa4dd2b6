//! Stock quote tool using the Alpha Vantage GLOBAL_QUOTE endpoint.

use std::collections::HashMap;

use assistant_core::ParameterSpec;
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use crate::config::{http_client, StockConfig};
use crate::error::ToolError;
use crate::tool::{Tool, ToolArgs, ToolPayload};

/// Keys Alpha Vantage uses to report problems with an HTTP 200.
const NOTICE_KEYS: [&str; 3] = ["Error Message", "Note", "Information"];

/// Stock price tool using Alpha Vantage.
///
/// # Parameters
///
/// - `symbol` (required): Ticker symbol, e.g. "AAPL" or "MSFT".
///
/// # Examples
///
/// ```json
/// {"symbol": "AAPL"}
/// {"symbol": "tsla"}
/// ```
pub struct StockPrice {
    client: reqwest::Client,
    config: StockConfig,
}

impl StockPrice {
    /// Create a new stock price tool.
    pub fn new(config: StockConfig) -> Self {
        Self {
            client: http_client(config.timeout),
            config,
        }
    }

    /// Fetch the raw quote object for a symbol.
    async fn fetch_quote(&self, symbol: &str) -> Result<HashMap<String, String>, ToolError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| ToolError::Configuration("Stock API key is missing".to_string()))?;

        let url = format!("{}/query", self.config.api_url.trim_end_matches('/'));
        debug!("Fetching stock quote from: {} (symbol: {})", url, symbol);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("function", "GLOBAL_QUOTE"),
                ("symbol", symbol),
                ("apikey", api_key),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ToolError::Upstream {
                status: Some(status.as_u16()),
                message: format!(
                    "Stock API returned status {}: {}",
                    status.as_u16(),
                    body.trim()
                ),
            });
        }

        let data: Value = response.json().await?;

        for key in NOTICE_KEYS {
            if let Some(notice) = data.get(key).and_then(Value::as_str) {
                return Err(ToolError::Upstream {
                    status: None,
                    message: format!("API Error: {}", notice),
                });
            }
        }

        let quote = match data.get("Global Quote") {
            Some(Value::Object(map)) if !map.is_empty() => map,
            _ => {
                return Err(ToolError::NotFound(format!(
                    "No data found for symbol: {}",
                    symbol
                )))
            }
        };

        Ok(quote
            .iter()
            .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
            .collect())
    }

    fn to_payload(symbol: &str, quote: &HashMap<String, String>) -> Result<ToolPayload, ToolError> {
        let field = |key: &str| -> Result<&str, ToolError> {
            quote
                .get(key)
                .map(String::as_str)
                .ok_or_else(|| ToolError::MalformedResponse(format!("quote is missing '{}'", key)))
        };
        let number = |key: &str| -> Result<f64, ToolError> {
            let raw = field(key)?;
            raw.trim().parse::<f64>().map_err(|_| {
                ToolError::MalformedResponse(format!("'{}' is not a number: {}", key, raw))
            })
        };

        let volume = field("06. volume")?;
        let volume: u64 = volume.trim().parse().map_err(|_| {
            ToolError::MalformedResponse(format!("'06. volume' is not an integer: {}", volume))
        })?;

        Ok(ToolPayload::new()
            .with("symbol", quote.get("01. symbol").map(String::as_str).unwrap_or(symbol))
            .with("price", number("05. price")?)
            .with("previous_close", number("08. previous close")?)
            .with("change", number("09. change")?)
            .with("change_percent", field("10. change percent")?)
            .with("volume", volume)
            .with("as_of_date", field("07. latest trading day")?)
            .with(
                "fetched_at",
                Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            ))
    }
}

impl Default for StockPrice {
    fn default() -> Self {
        Self::new(StockConfig::default())
    }
}

#[async_trait]
impl Tool for StockPrice {
    fn name(&self) -> &str {
        "get_stock_price"
    }

    fn description(&self) -> &str {
        "Get the current stock price and daily change for a company by its ticker symbol."
    }

    fn parameters(&self) -> IndexMap<String, ParameterSpec> {
        let mut params = IndexMap::new();
        params.insert(
            "symbol".to_string(),
            ParameterSpec::required_string("Stock ticker symbol (e.g. 'AAPL' for Apple)"),
        );
        params
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolPayload, ToolError> {
        let symbol = args.get_string("symbol")?.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(ToolError::InvalidParameter {
                name: "symbol".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        debug!("Getting stock price for {}", symbol);
        let quote = self.fetch_quote(&symbol).await?;
        Self::to_payload(&symbol, &quote)
    }
}
