//! Built-in tool implementations.

mod stock_price;
mod weather;

pub use stock_price::StockPrice;
pub use weather::{Units, Weather};
