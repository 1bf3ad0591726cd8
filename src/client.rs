//! Command Client
//!
//! One method per server opcode. Every method is one blocking round trip:
//! encode the frame, send it, read the status byte, decode the payload.
//!
//! ## Concurrency Model
//!
//! The protocol has no request identifiers, so a connection carries exactly
//! one request at a time. The connection sits behind a `parking_lot::Mutex`
//! that is held from the first byte sent to the last byte read, which lets
//! the client be shared by reference without interleaving frames.
//!
//! `putnr` is the exception to the round trip: the server sends nothing back,
//! so a failure on that call goes unnoticed.
//!
//! A transport failure discards the connection. Later calls fail with a
//! `NotConnected` I/O error instead of reading leftover bytes; open a new
//! client to continue.

use std::io::{self, BufReader, Read, Write};
use std::net::TcpStream;

use parking_lot::Mutex;

use crate::bulk::BulkCall;
use crate::config::{Config, GetListShape};
use crate::error::{Result, TyrantError};
use crate::network::Connection;
use crate::protocol::{encode_command, Command, ExtOptions, MiscOptions, ResponseReader};

/// Client for one Tokyo Tyrant server
pub struct Client<S: Read + Write = TcpStream> {
    /// The one connection; locked for each round trip
    conn: Mutex<Connection<S>>,

    /// Layout of `getlist` responses, if known ahead of time
    getlist_shape: GetListShape,
}

impl Client<TcpStream> {
    /// Connect using `config`
    pub fn open(config: &Config) -> Result<Self> {
        let conn = Connection::open(config)?;
        Ok(Self {
            conn: Mutex::new(conn),
            getlist_shape: config.getlist_shape,
        })
    }

    /// Connect to `host:port` with default settings
    pub fn connect(host: &str, port: u16) -> Result<Self> {
        Self::open(&Config::builder().host(host).port(port).build())
    }

    /// Close the socket
    pub fn close(self) -> Result<()> {
        self.conn.into_inner().close()
    }
}

impl<S: Read + Write> Client<S> {
    /// Wrap an already connected stream
    pub fn new(stream: S) -> Self {
        Self {
            conn: Mutex::new(Connection::new(stream)),
            getlist_shape: GetListShape::Auto,
        }
    }

    /// Pin the `getlist` response layout
    pub fn with_getlist_shape(mut self, shape: GetListShape) -> Self {
        self.getlist_shape = shape;
        self
    }

    pub fn getlist_shape(&self) -> GetListShape {
        self.getlist_shape
    }

    /// Unwrap the underlying stream
    pub fn into_inner(self) -> S {
        self.conn.into_inner().into_inner()
    }

    // =========================================================================
    // Round trip
    // =========================================================================

    /// Send `command`, check the status byte, then run `decode` on the payload
    ///
    /// A transport error leaves the stream at an unknown position, so the
    /// connection is marked broken and every later call fails fast.
    fn call<T>(
        &self,
        command: Command<'_>,
        decode: impl FnOnce(&mut ResponseReader<'_, BufReader<S>>) -> Result<T>,
    ) -> Result<T> {
        let frame = encode_command(&command);
        let mut conn = self.conn.lock();
        if conn.is_broken() {
            return Err(broken_connection());
        }

        let result = round_trip(&mut conn, &command, &frame, decode);
        if matches!(&result, Err(e) if e.is_transport()) {
            conn.mark_broken();
        }
        result
    }

    /// Round trip with no payload after the status byte
    fn call_unit(&self, command: Command<'_>) -> Result<()> {
        self.call(command, |_| Ok(()))
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Unconditionally set `key` to `value`
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.call_unit(Command::Put { key, value })
    }

    /// Set `key` to `value` only if `key` is absent
    pub fn putkeep(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.call_unit(Command::PutKeep { key, value })
    }

    /// Append `value` to the stored value, creating it if absent
    pub fn putcat(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.call_unit(Command::PutCat { key, value })
    }

    /// Append `value`, then keep only the last `width` bytes
    pub fn putshl(&self, key: &[u8], value: &[u8], width: u32) -> Result<()> {
        self.call_unit(Command::PutShl { key, value, width })
    }

    /// Set `key` to `value` without waiting for a reply
    pub fn putnr(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.call_unit(Command::PutNr { key, value })
    }

    /// Remove `key`; fails if it is absent
    pub fn out(&self, key: &[u8]) -> Result<()> {
        self.call_unit(Command::Out { key })
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Value stored under `key`; fails if it is absent
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        self.call(Command::Get { key }, |r| r.bytes())
    }

    /// Key/value pairs for every present key in `keys`
    pub fn mget(&self, keys: &[Vec<u8>]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        self.call(Command::Mget { keys }, |r| r.pair_list())
    }

    /// Size of the value stored under `key`
    pub fn vsiz(&self, key: &[u8]) -> Result<u32> {
        self.call(Command::Vsiz { key }, |r| r.length())
    }

    // =========================================================================
    // Iteration
    // =========================================================================

    /// Reset the server-side key cursor
    pub fn iterinit(&self) -> Result<()> {
        self.call_unit(Command::IterInit)
    }

    /// Next key under the cursor; a protocol error signals exhaustion
    pub fn iternext(&self) -> Result<Vec<u8>> {
        self.call(Command::IterNext, |r| r.bytes())
    }

    /// Up to `max` keys starting with `prefix`
    pub fn fwmkeys(&self, prefix: &[u8], max: u32) -> Result<Vec<Vec<u8>>> {
        self.call(Command::FwmKeys { prefix, max }, |r| r.bytes_list())
    }

    // =========================================================================
    // Counters
    // =========================================================================

    /// Add `num` to the integer stored under `key`, returning the new value
    pub fn addint(&self, key: &[u8], num: i32) -> Result<i32> {
        self.call(Command::AddInt { key, num }, |r| r.int())
    }

    /// Add `num` to the double stored under `key`, returning the new value
    pub fn adddouble(&self, key: &[u8], num: f64) -> Result<f64> {
        self.call(Command::AddDouble { key, num }, |r| r.double())
    }

    // =========================================================================
    // Scripting
    // =========================================================================

    /// Call the server-side extension `function` with `key` and `value`
    pub fn ext(&self, function: &str, options: ExtOptions, key: &[u8], value: &[u8]) -> Result<Vec<u8>> {
        self.call(Command::Ext { function, options, key, value }, |r| r.bytes())
    }

    /// Generic bulk call by function name
    ///
    /// How to read the returned list depends on `function`.
    pub fn misc(&self, function: &str, options: MiscOptions, args: &[Vec<u8>]) -> Result<Vec<Vec<u8>>> {
        self.call(Command::Misc { function, options, args }, |r| r.bytes_list())
    }

    /// Issue a typed bulk call
    pub fn bulk(&self, call: &BulkCall, options: MiscOptions) -> Result<Vec<Vec<u8>>> {
        let args = call.args();
        self.misc(call.function(), options, &args)
    }

    // =========================================================================
    // Database management
    // =========================================================================

    /// Flush the database to durable storage
    pub fn sync(&self) -> Result<()> {
        self.call_unit(Command::Sync)
    }

    /// Remove every record
    pub fn vanish(&self) -> Result<()> {
        self.call_unit(Command::Vanish)
    }

    /// Hot-copy the database file to `path` on the server
    pub fn copy(&self, path: &str) -> Result<()> {
        self.call_unit(Command::Copy { path: path.as_bytes() })
    }

    /// Restore from the update log at `path` as of `timestamp_ms`
    pub fn restore(&self, path: &str, timestamp_ms: u64) -> Result<()> {
        self.call_unit(Command::Restore { path: path.as_bytes(), timestamp_ms })
    }

    /// Make the server replicate from `host:port`
    pub fn setmst(&self, host: &str, port: u16) -> Result<()> {
        self.call_unit(Command::SetMst { host: host.as_bytes(), port: u32::from(port) })
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Number of records
    pub fn rnum(&self) -> Result<u64> {
        self.call(Command::Rnum, |r| r.long())
    }

    /// Database size in bytes
    pub fn size(&self) -> Result<u64> {
        self.call(Command::Size, |r| r.long())
    }

    /// Raw stat report: one `name\tvalue` line per entry
    pub fn stat(&self) -> Result<Vec<u8>> {
        self.call(Command::Stat, |r| r.bytes())
    }
}

fn round_trip<S: Read + Write, T>(
    conn: &mut Connection<S>,
    command: &Command<'_>,
    frame: &[u8],
    decode: impl FnOnce(&mut ResponseReader<'_, BufReader<S>>) -> Result<T>,
) -> Result<T> {
    tracing::trace!("Sending {:?} frame ({} bytes) to {}", command.opcode(), frame.len(), conn.peer_addr());
    conn.send(frame)?;

    let mut response = conn.response();
    if !command.expects_reply() {
        // The server sends nothing back; a failure here goes unnoticed
        return decode(&mut response);
    }

    if let Err(err) = response.status() {
        if command.count_follows_failure() {
            response.length()?;
        }
        return Err(err);
    }
    decode(&mut response)
}

fn broken_connection() -> TyrantError {
    TyrantError::Io(io::Error::new(
        io::ErrorKind::NotConnected,
        "connection was discarded after a transport failure",
    ))
}
