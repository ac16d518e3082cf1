pub mod calculations;
pub mod catalog;
pub mod comments;
pub mod corrections;
pub mod rates;
pub mod ratios;
pub mod scoring;

pub use catalog::FertilizerCatalog;
pub use rates::RateEngine;
