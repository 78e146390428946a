pub mod calc;
pub mod error;
pub mod products;
pub mod tariff;
pub mod types;

pub use error::LandedCostError;
pub use types::*;

/// Standard result type for all landed-cost operations
pub type LandedCostResult<T> = Result<T, LandedCostError>;
