//! Row-oriented SQLite store for raw assessment rows and the dimensional model.

pub mod error;
mod load;
pub mod store;

pub use error::{Result, StoreError};
pub use store::RowStore;
