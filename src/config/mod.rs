pub mod env;
mod loader;

pub use env::{AppConfig, ClassifierConfig, DetectionConfig, DirectoryConfig, ServerConfig};
pub use loader::load_config;
