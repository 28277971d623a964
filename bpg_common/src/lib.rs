mod amount;

pub mod helpers;
pub mod op;
mod secret;

pub use amount::{Amount, AmountConversionError, MINOR_UNITS_PER_MAJOR};
pub use secret::Secret;
