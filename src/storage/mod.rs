pub mod manager;
pub mod memory;
pub mod postgres;
pub mod table;

pub use manager::DataStore;
pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use table::{Column, ColumnKind, Table, Value};
