pub mod memory;
pub mod pool;
pub mod schema;
pub mod store;

pub use memory::MemoryStore;
pub use store::{MarketStore, PgStore};
