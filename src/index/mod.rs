//! Index Module
//!
//! Bridges user keys to blob locations through the primary store.
//!
//! ## Responsibilities
//! - Encode/decode the index record stored in place of a value
//! - Abstract the primary store behind [`PrimaryStore`]
//!
//! ## Index Record Format
//! ```text
//! ┌──────────────────┬────────────────┬──────────────┐
//! │ FileNo (varint)  │ Offset (varint)│ Size (varint)│
//! └──────────────────┴────────────────┴──────────────┘
//! ```

mod record;
mod store;

pub use record::IndexRecord;
pub use store::{MemStore, PrimaryStore};
