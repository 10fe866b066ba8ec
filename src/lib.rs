pub mod api;
pub mod config;
pub mod directory;
pub mod domain;
pub mod observability;
pub mod rating;
pub mod seed;
pub mod storage;

pub use config::Config;
pub use directory::{CityDirectory, DirectoryProvider, DirectorySnapshot};
pub use domain::{City, LineItem, Quote, Route};
pub use rating::{RateEngine, RateOutcome, RateSettings};
