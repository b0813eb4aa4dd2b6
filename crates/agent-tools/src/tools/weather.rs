//! Weather tool using the OpenWeatherMap current-weather API.

use assistant_core::ParameterSpec;
use async_trait::async_trait;
use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::{http_client, WeatherConfig};
use crate::error::ToolError;
use crate::tool::{Tool, ToolArgs, ToolPayload};

/// Units accepted by OpenWeatherMap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Units {
    Metric,
    Imperial,
    Standard,
}

impl Units {
    /// Parse a units name, falling back to metric for anything unknown.
    pub fn parse_or_metric(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "metric" => Units::Metric,
            "imperial" => Units::Imperial,
            "standard" => Units::Standard,
            other => {
                warn!("Unknown units '{}', falling back to metric", other);
                Units::Metric
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
            Units::Standard => "standard",
        }
    }

    fn temperature_unit(&self) -> &'static str {
        match self {
            Units::Metric => "°C",
            Units::Imperial => "°F",
            Units::Standard => "K",
        }
    }

    fn wind_speed_unit(&self) -> &'static str {
        match self {
            Units::Imperial => "mph",
            Units::Metric | Units::Standard => "m/s",
        }
    }
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    name: Option<String>,
    sys: Option<SysInfo>,
    main: MainReadings,
    wind: Option<WindReadings>,
    #[serde(default)]
    weather: Vec<Condition>,
    dt: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct SysInfo {
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: f64,
    feels_like: Option<f64>,
    humidity: Option<u64>,
    pressure: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct WindReadings {
    speed: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Condition {
    main: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    message: String,
}

/// Weather tool that fetches current conditions from OpenWeatherMap.
///
/// # Parameters
///
/// - `location` (required): City name, optionally with a country code ("Paris, FR").
/// - `units` (optional): "metric" (default), "imperial" or "standard".
///
/// # Examples
///
/// ```json
/// {"location": "New York"}
/// {"location": "Delhi", "units": "imperial"}
/// ```
pub struct Weather {
    client: reqwest::Client,
    config: WeatherConfig,
}

impl Weather {
    /// Create a new weather tool.
    pub fn new(config: WeatherConfig) -> Self {
        Self {
            client: http_client(config.timeout),
            config,
        }
    }

    /// Fetch and reshape the current weather for a location.
    async fn fetch_weather(&self, location: &str, units: Units) -> Result<ToolPayload, ToolError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| ToolError::Configuration("Weather API key is missing".to_string()))?;

        let url = format!("{}/data/2.5/weather", self.config.api_url.trim_end_matches('/'));
        debug!("Fetching weather from: {} (location: {})", url, location);

        let response = self
            .client
            .get(&url)
            .query(&[("q", location), ("units", units.as_str()), ("appid", api_key)])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ProviderError>(&body)
                .map(|e| e.message)
                .unwrap_or_else(|_| body.trim().to_string());
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(ToolError::NotFound(format!(
                    "Location not found: {} ({})",
                    location, message
                )));
            }
            return Err(ToolError::Upstream {
                status: Some(status.as_u16()),
                message: format!("Weather API returned status {}: {}", status.as_u16(), message),
            });
        }

        let data: CurrentWeather = serde_json::from_str(&body)
            .map_err(|e| ToolError::MalformedResponse(format!("weather response: {}", e)))?;

        Ok(Self::to_payload(data, location, units))
    }

    fn to_payload(data: CurrentWeather, requested: &str, units: Units) -> ToolPayload {
        let place = data.name.filter(|n| !n.is_empty()).unwrap_or_else(|| requested.to_string());
        let location = match data.sys.and_then(|s| s.country) {
            Some(country) if !country.is_empty() => format!("{}, {}", place, country),
            _ => place,
        };
        let (conditions, description) = data
            .weather
            .into_iter()
            .next()
            .map(|c| (c.main, c.description))
            .unwrap_or_else(|| ("Unknown".to_string(), "unknown".to_string()));

        ToolPayload::new()
            .with("location", location)
            .with("temperature", data.main.temp)
            .with("feels_like", data.main.feels_like)
            .with("temperature_unit", units.temperature_unit())
            .with("humidity", data.main.humidity)
            .with("wind_speed", data.wind.and_then(|w| w.speed))
            .with("wind_speed_unit", units.wind_speed_unit())
            .with("pressure", data.main.pressure)
            .with("conditions", conditions)
            .with("description", description)
            .with("observed_at", data.dt)
    }
}

impl Default for Weather {
    fn default() -> Self {
        Self::new(WeatherConfig::default())
    }
}

#[async_trait]
impl Tool for Weather {
    fn name(&self) -> &str {
        "get_weather"
    }

    fn description(&self) -> &str {
        "Get the current weather for a specific location. \
         Use for questions about current temperature, conditions or forecasts."
    }

    fn parameters(&self) -> IndexMap<String, ParameterSpec> {
        let mut params = IndexMap::new();
        params.insert(
            "location".to_string(),
            ParameterSpec::required_string("City name, optionally with country code (e.g. 'London, UK')"),
        );
        params.insert(
            "units".to_string(),
            ParameterSpec::optional_string("Units: 'metric' (default), 'imperial' or 'standard'"),
        );
        params
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolPayload, ToolError> {
        let location = args.get_string("location")?;
        let location = location.trim();
        if location.is_empty() {
            return Err(ToolError::InvalidParameter {
                name: "location".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        let units = Units::parse_or_metric(
            &args
                .get_string_opt("units")
                .unwrap_or_else(|| self.config.units.clone()),
        );

        debug!("Getting weather for '{}' ({})", location, units.as_str());
        self.fetch_weather(location, units).await
    }
}
