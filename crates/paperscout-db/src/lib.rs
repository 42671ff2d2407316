//! paperscout-db — relational paper store.
//!
//! SQLite-backed entity graph: papers, authors, keywords and their
//! many-to-many association tables. The store owns schema creation on first
//! open and exposes a deduplicating, transactional upsert keyed on
//! (source, source_id).

pub mod error;
pub mod papers;
pub mod schema;
pub mod store;

pub use error::{Result, StoreError};
pub use papers::PaperStore;
pub use schema::{Author, Keyword, Paper, PaperRecord};
pub use store::Store;
