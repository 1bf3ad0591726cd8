//! Network Module
//!
//! Byte plumbing between the client and one server.
//!
//! ## Architecture
//! - `transport`: exact-length send and receive over any stream
//! - `Connection`: exclusively owned stream handle, one request in flight

pub mod transport;
mod connection;

pub use connection::Connection;
