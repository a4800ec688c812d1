pub mod analyzer;
pub mod fleet;
pub mod reconciler;

pub use analyzer::{VideoAnalysis, VideoAnalyzer};
pub use fleet::{FleetCoordinator, FleetReport};
pub use reconciler::{DeletionReconciler, DeletionReport};
