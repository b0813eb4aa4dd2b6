//! Exercise the data tools against the live providers.
//!
//! Run with: cargo run -p agent-tools --example test_tools
//!
//! Reads `WEATHER_API_KEY` and `ALPHA_VANTAGE_API_KEY` from the environment
//! or a `.env` file. Tools without a key report a configuration failure.

use std::collections::HashMap;

use agent_tools::{default_registry, StockConfig, ToolInvocation, ToolRegistry, WeatherConfig};
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("agent_tools=debug".parse()?),
        )
        .init();

    println!("=== Agent Tools Crate Test ===\n");

    let registry = default_registry(WeatherConfig::from_env(), StockConfig::from_env());

    println!("Registered tools:");
    for descriptor in registry.descriptors() {
        println!("  - {}: {}", descriptor.name, descriptor.description);
    }
    println!();

    run(&registry, "get_weather", &[("location", "London")]).await;
    run(&registry, "get_weather", &[("location", "Delhi"), ("units", "imperial")]).await;
    run(&registry, "get_weather", &[("location", "Nowhereville Xyz")]).await;
    run(&registry, "get_stock_price", &[("symbol", "AAPL")]).await;
    run(&registry, "get_stock_price", &[("symbol", "ZZZZZZ")]).await;
    run(&registry, "get_news", &[("topic", "rust")]).await;

    println!("\n=== All tests completed ===");
    Ok(())
}

async fn run(registry: &ToolRegistry, name: &str, args: &[(&str, &str)]) {
    let arguments: HashMap<String, Value> = args
        .iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect();
    let invocation = ToolInvocation::new(name, arguments);

    println!("--- {} {:?} ---", name, args);
    if let Err(e) = registry.validate(&invocation) {
        println!("  [INVALID] {}", e);
    }
    let result = registry.execute(&invocation).await;
    let label = if result.is_success() { "OK" } else { "FAILURE" };
    println!("  [{}] {}", label, result.to_fragment());
}
