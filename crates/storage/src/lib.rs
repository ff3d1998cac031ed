pub mod kv;
pub mod store;

pub use kv::{JsonFileStore, KeyValueStore, KvError, MemoryStore};
pub use store::{LoadError, StoreError, TransactionStore, RECENT_LIMIT, STORAGE_KEY};
