//! Response decoding
//!
//! Every response starts with a one-byte status. Zero means success and is
//! followed by an opcode-specific payload; anything else ends the response.

use std::io::Read;

use crate::error::{Result, TyrantError};
use crate::network::transport::recv_exact;

use super::codec::join_double;

/// Status byte of a successful response
pub const STATUS_OK: u8 = 0x00;

/// Reads the pieces of one response from a stream
pub struct ResponseReader<'a, R: Read> {
    reader: &'a mut R,
}

impl<'a, R: Read> ResponseReader<'a, R> {
    pub fn new(reader: &'a mut R) -> Self {
        Self { reader }
    }

    /// Read the status byte, failing with `Protocol(code)` if it is nonzero
    pub fn status(&mut self) -> Result<()> {
        let code = recv_exact(&mut *self.reader, 1)?[0];
        if code != STATUS_OK {
            tracing::debug!("Server returned status code {}", code);
            return Err(TyrantError::Protocol(code));
        }
        Ok(())
    }

    /// 4-byte length or count
    pub fn length(&mut self) -> Result<u32> {
        let buf = recv_exact(&mut *self.reader, 4)?;
        Ok(u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]))
    }

    /// 4-byte signed integer (the `addint` result)
    pub fn int(&mut self) -> Result<i32> {
        Ok(self.length()? as i32)
    }

    /// 8-byte integer
    pub fn long(&mut self) -> Result<u64> {
        let buf = recv_exact(&mut *self.reader, 8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&buf);
        Ok(u64::from_be_bytes(raw))
    }

    /// Integer part and fixed-point fraction, combined into a double
    pub fn double(&mut self) -> Result<f64> {
        let integ = self.long()? as i64;
        let fract = self.long()? as i64;
        Ok(join_double(integ, fract))
    }

    /// Length-prefixed byte string
    pub fn bytes(&mut self) -> Result<Vec<u8>> {
        let len = self.length()? as usize;
        Ok(recv_exact(&mut *self.reader, len)?)
    }

    /// Count followed by that many length-prefixed byte strings
    pub fn bytes_list(&mut self) -> Result<Vec<Vec<u8>>> {
        let count = self.length()? as usize;
        let mut out = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            out.push(self.bytes()?);
        }
        Ok(out)
    }

    /// Count followed by that many key/value pairs
    ///
    /// Each pair carries both lengths before both bodies.
    pub fn pair_list(&mut self) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let count = self.length()? as usize;
        let mut out = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            let klen = self.length()? as usize;
            let vlen = self.length()? as usize;
            let key = recv_exact(&mut *self.reader, klen)?;
            let value = recv_exact(&mut *self.reader, vlen)?;
            out.push((key, value));
        }
        Ok(out)
    }
}
