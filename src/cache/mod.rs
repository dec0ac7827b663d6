//! In-memory TTL caching shared by the content gateway and the feed proxy.

mod lock;
mod store;

pub use store::TtlCache;
