//! Tool contract, registry and data tools for the Q&A assistant.
//!
//! A [`Tool`] wraps one external real-time data provider. Tools are
//! registered once in a [`ToolRegistry`] at startup; the router asks the
//! registry to validate and run a [`ToolInvocation`] and always gets a
//! [`ToolResult`] back, never an error.
//!
//! # Built-in Tools
//!
//! - [`Weather`] - Current weather via OpenWeatherMap (`WEATHER_API_KEY`).
//! - [`StockPrice`] - Latest stock quote via Alpha Vantage (`ALPHA_VANTAGE_API_KEY`).
//!
//! # Example
//!
//! ```rust,ignore
//! use agent_tools::{default_registry, StockConfig, ToolInvocation, WeatherConfig};
//! use std::collections::HashMap;
//! use serde_json::Value;
//!
//! #[tokio::main]
//! async fn main() {
//!     let registry = default_registry(WeatherConfig::from_env(), StockConfig::from_env());
//!
//!     let mut arguments = HashMap::new();
//!     arguments.insert("symbol".to_string(), Value::String("AAPL".to_string()));
//!
//!     let result = registry
//!         .execute(&ToolInvocation::new("get_stock_price", arguments))
//!         .await;
//!     println!("{}", result.to_fragment());
//! }
//! ```

use std::sync::Arc;

mod config;
mod error;
mod registry;
mod tool;
pub mod tools;

pub use config::{StockConfig, WeatherConfig, DEFAULT_STOCK_API_URL, DEFAULT_WEATHER_API_URL};
pub use error::{RegistryError, ToolError, ToolErrorKind};
pub use registry::ToolRegistry;
pub use tool::{Tool, ToolArgs, ToolInvocation, ToolPayload, ToolResult};
pub use tools::{StockPrice, Units, Weather};

// Re-export async_trait for convenience
pub use async_trait::async_trait;

/// Create a new registry with the built-in tools registered.
pub fn default_registry(weather: WeatherConfig, stock: StockConfig) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    for tool in [
        Arc::new(Weather::new(weather)) as Arc<dyn Tool>,
        Arc::new(StockPrice::new(stock)),
    ] {
        if let Err(e) = registry.register_shared(tool) {
            tracing::warn!("Skipping tool: {}", e);
        }
    }

    registry
}
