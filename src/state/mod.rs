pub mod notifications;
pub mod store;

pub use notifications::{NoticeLevel, Notification};
pub use store::{RemovalOutcome, SessionStore};
