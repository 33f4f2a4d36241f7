pub mod api;
pub mod error;

pub use api::{CoinGeckoAPI, TimeRange};
pub use error::{ApiError, Operation};
