pub mod http;
pub mod memory;
pub mod store;

pub use http::JournalClient;
pub use memory::{BrewSession, MemoryStore, NewProduct, NewSession, Product};
pub use store::{LookupStore, StoreError};
