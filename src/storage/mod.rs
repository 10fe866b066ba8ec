pub mod error;
pub mod memory;
pub mod postgres;
pub mod traits;

pub use error::{StorageError, StorageResult};
pub use memory::MemoryStorage;
pub use postgres::PostgresStorage;
pub use traits::Storage;
