pub mod error;
pub mod traits;
pub mod types;

pub use error::ScanError;
pub use traits::MarketDataProvider;
pub use types::*;
