pub mod backup;
pub mod collector;
pub mod config;
pub mod error;
pub mod paths;
pub mod record;
pub mod restore;
pub mod store;

pub use error::{Error, Result};
pub use record::HistoryRecord;
pub use store::Store;
