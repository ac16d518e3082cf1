pub mod comments;
pub mod extraction;

pub use comments::{CommentSource, CommentsClient, CommentsSummary};
pub use extraction::{ExtractedAnalysis, ExtractionClient};
