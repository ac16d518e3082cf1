pub mod gauge;

pub use gauge::{level_gauge, score_gauge};
