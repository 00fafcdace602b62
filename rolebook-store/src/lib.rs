pub mod error;
pub mod memory;
pub mod postgres;
pub mod schema;
pub mod traits;

pub use error::{StorageError, StorageResult};
pub use memory::MemoryStore;
pub use postgres::{PgStore, PgStoreConfig};
pub use traits::{BookStore, BookUpdate, NewBook, NewRole, Page, RoleStore, RoleUpdate};
