//! Transport primitives
//!
//! Exact-byte send and receive. No framing knowledge lives here.

use std::io::{self, Read, Write};

/// Upper bound on a single `read` call
pub const RECV_CHUNK_SIZE: usize = 8192;

/// Write every byte of `bytes`, then flush
pub fn send_all<W: Write + ?Sized>(writer: &mut W, bytes: &[u8]) -> io::Result<()> {
    writer.write_all(bytes)?;
    writer.flush()
}

/// Read exactly `n` bytes
///
/// Fails with `UnexpectedEof` if the peer closes before `n` bytes arrive.
pub fn recv_exact<R: Read + ?Sized>(reader: &mut R, n: usize) -> io::Result<Vec<u8>> {
    let mut out = Vec::with_capacity(n.min(RECV_CHUNK_SIZE));
    let mut chunk = [0u8; RECV_CHUNK_SIZE];

    while out.len() < n {
        let want = (n - out.len()).min(RECV_CHUNK_SIZE);
        match reader.read(&mut chunk[..want]) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("connection closed after {} of {} bytes", out.len(), n),
                ))
            }
            Ok(read) => out.extend_from_slice(&chunk[..read]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(out)
}
