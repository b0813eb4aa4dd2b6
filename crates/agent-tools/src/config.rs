//! Provider configuration for the data tools.
//!
//! Missing API keys are not an error here: a tool without a key still
//! registers and reports a `configuration` failure when it is called.

use std::env;
use std::time::Duration;

/// Default OpenWeatherMap base URL.
pub const DEFAULT_WEATHER_API_URL: &str = "https://api.openweathermap.org";

/// Default Alpha Vantage base URL.
pub const DEFAULT_STOCK_API_URL: &str = "https://www.alphavantage.co";

/// Default per-request timeout for provider calls.
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the weather tool.
#[derive(Debug, Clone)]
pub struct WeatherConfig {
    /// OpenWeatherMap API key.
    pub api_key: Option<String>,

    /// Base URL (overridable for tests).
    pub api_url: String,

    /// Default units when the caller gives none.
    pub units: String,

    /// HTTP request timeout.
    pub timeout: Duration,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: DEFAULT_WEATHER_API_URL.to_string(),
            units: "metric".to_string(),
            timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }
}

impl WeatherConfig {
    /// Create configuration from environment variables.
    ///
    /// - `WEATHER_API_KEY` - OpenWeatherMap key (optional)
    /// - `WEATHER_API_URL` - Base URL (default: https://api.openweathermap.org)
    /// - `WEATHER_UNITS` - metric, imperial or standard (default: metric)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: non_empty_var("WEATHER_API_KEY"),
            api_url: non_empty_var("WEATHER_API_URL").unwrap_or(defaults.api_url),
            units: non_empty_var("WEATHER_UNITS").unwrap_or(defaults.units),
            timeout: defaults.timeout,
        }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the base URL.
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Set the default units.
    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = units.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Configuration for the stock price tool.
#[derive(Debug, Clone)]
pub struct StockConfig {
    /// Alpha Vantage API key.
    pub api_key: Option<String>,

    /// Base URL (overridable for tests).
    pub api_url: String,

    /// HTTP request timeout.
    pub timeout: Duration,
}

impl Default for StockConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: DEFAULT_STOCK_API_URL.to_string(),
            timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }
}

impl StockConfig {
    /// Create configuration from environment variables.
    ///
    /// - `ALPHA_VANTAGE_API_KEY` - Alpha Vantage key (optional)
    /// - `ALPHA_VANTAGE_API_URL` - Base URL (default: https://www.alphavantage.co)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: non_empty_var("ALPHA_VANTAGE_API_KEY"),
            api_url: non_empty_var("ALPHA_VANTAGE_API_URL").unwrap_or(defaults.api_url),
            timeout: defaults.timeout,
        }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the base URL.
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Build the shared HTTP client for a provider.
pub(crate) fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(concat!("qa-assistant/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!("Failed to build HTTP client, using defaults: {}", e);
            reqwest::Client::new()
        })
}
