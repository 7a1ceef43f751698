// Service exports
pub mod cache;
pub mod memory;
pub mod postgres;
pub mod postgrest;
pub mod repository;
pub mod store;

pub use cache::{CacheError, CacheKey, CacheManager};
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use postgrest::PostgrestStore;
pub use repository::ProfileRepository;
pub use store::{
    Filter, FilterOp, Store, StoreError, Table, LIKE_CONFLICT_KEYS, MESSAGE_CONFLICT_KEYS,
};
