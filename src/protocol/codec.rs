//! Protocol codec
//!
//! Builds request frames for the binary protocol.
//!
//! ## Wire Format
//!
//! Every request starts with the magic byte and the opcode. All integers are
//! big-endian.
//! ```text
//! ┌───────────┬────────────┬──────────────────────────────┐
//! │ 0xC8 (1)  │ Opcode (1) │   Opcode-specific fields     │
//! └───────────┴────────────┴──────────────────────────────┘
//! ```
//!
//! ### Frame shapes
//! - bare:       (nothing)
//! - key:        klen (4) + key
//! - key+u64:    klen (4) + n (8) + key
//! - key+u32:    klen (4) + n (4) + key
//! - key+value:  klen (4) + vlen (4) [+ width (4)] + key + value
//! - function:   nlen (4) + opts (4) + argc (4) + name + { alen (4) + arg }*
//! - ext:        nlen (4) + opts (4) + klen (4) + vlen (4) + name + key + value
//! - key list:   count (4) + { klen (4) + key }*
//! - double:     klen (4) + integ (8) + fract (8) + key

use bytes::BufMut;

use super::{Command, Opcode};

/// First byte of every request
pub const MAGIC: u8 = 0xC8;

/// Fixed-point scale of the fractional half of a double
pub const FRACTION_SCALE: f64 = 1e12;

// =============================================================================
// Command Encoding
// =============================================================================

/// Encode a command to bytes
pub fn encode_command(command: &Command<'_>) -> Vec<u8> {
    let mut buf = Vec::with_capacity(encoded_len_hint(command));
    buf.put_u8(MAGIC);
    buf.put_u8(command.opcode() as u8);

    match *command {
        Command::IterInit
        | Command::IterNext
        | Command::Sync
        | Command::Vanish
        | Command::Rnum
        | Command::Size
        | Command::Stat => {}

        Command::Out { key } | Command::Get { key } | Command::Vsiz { key } => {
            put_field(&mut buf, key);
        }
        Command::Copy { path } => put_field(&mut buf, path),

        Command::Put { key, value }
        | Command::PutKeep { key, value }
        | Command::PutCat { key, value }
        | Command::PutNr { key, value } => {
            buf.put_u32(key.len() as u32);
            buf.put_u32(value.len() as u32);
            buf.put_slice(key);
            buf.put_slice(value);
        }
        Command::PutShl { key, value, width } => {
            buf.put_u32(key.len() as u32);
            buf.put_u32(value.len() as u32);
            buf.put_u32(width);
            buf.put_slice(key);
            buf.put_slice(value);
        }

        Command::Restore { path, timestamp_ms } => {
            buf.put_u32(path.len() as u32);
            buf.put_u64(timestamp_ms);
            buf.put_slice(path);
        }
        Command::FwmKeys { prefix, max } => put_field_with_u32(&mut buf, prefix, max),
        Command::AddInt { key, num } => put_field_with_u32(&mut buf, key, num as u32),
        Command::SetMst { host, port } => put_field_with_u32(&mut buf, host, port),

        Command::AddDouble { key, num } => {
            let (integ, fract) = split_double(num);
            buf.put_u32(key.len() as u32);
            buf.put_i64(integ);
            buf.put_i64(fract);
            buf.put_slice(key);
        }

        Command::Ext { function, options, key, value } => {
            buf.put_u32(function.len() as u32);
            buf.put_u32(options.bits());
            buf.put_u32(key.len() as u32);
            buf.put_u32(value.len() as u32);
            buf.put_slice(function.as_bytes());
            buf.put_slice(key);
            buf.put_slice(value);
        }
        Command::Misc { function, options, args } => {
            buf.put_u32(function.len() as u32);
            buf.put_u32(options.bits());
            buf.put_u32(args.len() as u32);
            buf.put_slice(function.as_bytes());
            for arg in args {
                put_field(&mut buf, arg);
            }
        }
        Command::Mget { keys } => {
            buf.put_u32(keys.len() as u32);
            for key in keys {
                put_field(&mut buf, key);
            }
        }
    }

    debug_assert_eq!(buf[1], command.opcode() as u8);
    buf
}

/// Length-prefixed field
fn put_field(buf: &mut Vec<u8>, field: &[u8]) {
    buf.put_u32(field.len() as u32);
    buf.put_slice(field);
}

/// Length of `field`, then `n`, then `field` itself
fn put_field_with_u32(buf: &mut Vec<u8>, field: &[u8], n: u32) {
    buf.put_u32(field.len() as u32);
    buf.put_u32(n);
    buf.put_slice(field);
}

fn encoded_len_hint(command: &Command<'_>) -> usize {
    let payload = match *command {
        Command::Put { key, value }
        | Command::PutKeep { key, value }
        | Command::PutCat { key, value }
        | Command::PutShl { key, value, .. }
        | Command::PutNr { key, value } => 12 + key.len() + value.len(),
        Command::Misc { function, args, .. } => {
            12 + function.len() + args.iter().map(|a| 4 + a.len()).sum::<usize>()
        }
        Command::Mget { keys } => 4 + keys.iter().map(|k| 4 + k.len()).sum::<usize>(),
        _ => 32,
    };
    2 + payload
}

// =============================================================================
// Fixed-point doubles
// =============================================================================

/// Split a double into its integer part and its fraction scaled by 1e12
///
/// Both halves carry the sign of `num` and are truncated toward zero.
pub fn split_double(num: f64) -> (i64, i64) {
    let integ = num.trunc();
    let fract = ((num - integ) * FRACTION_SCALE).trunc();
    (integ as i64, fract as i64)
}

/// Inverse of [`split_double`]
pub fn join_double(integ: i64, fract: i64) -> f64 {
    integ as f64 + fract as f64 / FRACTION_SCALE
}
