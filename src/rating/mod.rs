pub mod engine;
pub mod pricing;

pub use engine::{RateEngine, RateOutcome, RateSettings};
pub use pricing::{price_for_weight, to_minor_units};
