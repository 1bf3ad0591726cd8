//! # tyrantkv
//!
//! A client for the Tokyo Tyrant binary protocol:
//! - Bit-exact request framing and response decoding
//! - One blocking round trip per command, one request in flight per connection
//! - Dict-like stores for flat and table databases
//! - Lazy, immutable table queries
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────┐     ┌──────────────────────────┐
//! │   KvStore / TableStore   │◄────┤          Query           │
//! │       (RecordMap)        │     │  (conditions + cache)    │
//! └────────────┬─────────────┘     └──────────────────────────┘
//!              │
//! ┌────────────▼─────────────┐
//! │          Client          │  one method per opcode
//! └────────────┬─────────────┘
//!              │
//! ┌────────────▼─────────────┐
//! │    Protocol (codec)      │  frames out, typed payloads in
//! └────────────┬─────────────┘
//!              │
//! ┌────────────▼─────────────┐
//! │  Network (transport)     │  exact-byte send / receive
//! └──────────────────────────┘
//! ```
//!
//! ```no_run
//! use tyrantkv::{Config, KvStore, RecordMap};
//!
//! let store = KvStore::open(&Config::default())?;
//! store.set(b"greeting", &b"hello".to_vec())?;
//! store.concat(b"greeting", &b" world".to_vec(), None)?;
//! assert_eq!(store.get(b"greeting")?, b"hello world".to_vec());
//! # Ok::<(), tyrantkv::TyrantError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod network;
pub mod protocol;
pub mod client;
pub mod bulk;
pub mod mapping;
pub mod query;


// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{TyrantError, Result};
pub use config::{Config, GetListShape, DEFAULT_PORT};
pub use client::Client;
pub use bulk::{BulkCall, IndexType};
pub use mapping::{KvStore, Record, RecordMap, TableStore};
pub use protocol::{ExtOptions, MiscOptions};
pub use query::{Condition, FilterValue, Query, QueryOp, QuerySlice, SortOrder};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of tyrantkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
