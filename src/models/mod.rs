pub mod fertilizer;
pub mod nutrient;
pub mod profile;
pub mod program;
pub mod recommendation;
pub mod report;
pub mod selection;
pub mod tank_mix;

pub use fertilizer::*;
pub use nutrient::*;
pub use profile::*;
pub use program::*;
pub use recommendation::*;
pub use report::*;
pub use selection::*;
pub use tank_mix::*;
