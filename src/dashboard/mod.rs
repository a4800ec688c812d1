mod handler;
mod types;
pub mod utils;

pub use handler::router;
pub use types::DashboardState;
