//! Protocol Module
//!
//! Wire format of the Tokyo Tyrant binary protocol.
//!
//! ### Request Format
//! ```text
//! ┌───────────┬────────────┬──────────────────────────────┐
//! │ 0xC8 (1)  │ Opcode (1) │   Opcode-specific fields     │
//! └───────────┴────────────┴──────────────────────────────┘
//! ```
//!
//! ### Response Format
//! ```text
//! ┌───────────┬──────────────────────────────────────────┐
//! │Status (1) │ Opcode-specific payload (only if 0x00)   │
//! └───────────┴──────────────────────────────────────────┘
//! ```
//!
//! Status codes other than 0x00 are opaque server failures.

mod command;
mod response;
mod codec;

pub use command::{Command, ExtOptions, MiscOptions, Opcode};
pub use response::{ResponseReader, STATUS_OK};
pub use codec::{encode_command, join_double, split_double, FRACTION_SCALE, MAGIC};
