pub mod comments;
pub mod corrections;
pub mod nutrients;
pub mod programs;
pub mod score;
pub mod tank_mix;

pub use comments::CommentsScreen;
pub use corrections::CorrectionsScreen;
pub use nutrients::NutrientsScreen;
pub use programs::{ProgramDraft, ProgramsScreen};
pub use score::ScoreScreen;
pub use tank_mix::TankMixScreen;
