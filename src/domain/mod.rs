pub mod comment;
pub mod keyword;
pub mod types;
pub mod video;

pub use comment::Comment;
pub use keyword::filter_by_keyword;
pub use types::{AnalysisStatus, ClassificationResult, DetectionSettings, RiskLevel};
pub use video::Video;
