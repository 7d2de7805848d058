//! Cache module for storing fetched country CIDR lists on disk
//!
//! Each country gets one timestamped record. Unreadable records are treated as
//! missing so a damaged cache can never stop a fetch.

mod manager;

pub use manager::{CacheManager, CacheRecord};
