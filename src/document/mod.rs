//! Document model and its shared store.
//!
//! ```text
//! target file ──load/reload──► DocumentStore ◄──upsert── POST /update/{id}
//!                                   │
//!                                   └──snapshot──► GET /fetch
//! ```

mod block;
mod error;
mod store;

pub use block::{BlockId, Document, TextBlock};
pub use error::DocumentError;
pub use store::DocumentStore;
