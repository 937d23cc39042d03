#![forbid(unsafe_code)]

mod db;
mod entry;
mod list;
mod lru;

pub use db::Db;
pub use entry::CacheEntry;
pub use list::{RecencyList, Slot};
pub use lru::LruStore;
