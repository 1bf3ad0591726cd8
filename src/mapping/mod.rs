//! Mapping Module
//!
//! Presents a [`Client`] as a key → value mapping.
//!
//! ## Variants
//! - [`KvStore`]: values are raw bytes (hash, B+ tree, fixed-length databases)
//! - [`TableStore`]: values are column records (table databases)
//!
//! Both implement [`RecordMap`]. Single-key reads and deletes turn a protocol
//! failure into `KeyNotFound`; bulk calls go through the `misc` opcode.

use std::collections::{BTreeMap, HashMap};
use std::io::{Read, Write};

use crate::client::Client;
use crate::config::GetListShape;
use crate::error::{Result, TyrantError};
use crate::protocol::{ExtOptions, MiscOptions};
use crate::bulk::BulkCall;

mod record;
mod flat;
mod table;

pub use record::{Record, COLUMN_SEPARATOR};
pub use flat::KvStore;
pub use table::TableStore;

/// Dict-like surface shared by both store variants
pub trait RecordMap {
    /// Stream type of the underlying client
    type Stream: Read + Write;

    /// What a key maps to
    type Value;

    /// The underlying command client
    fn client(&self) -> &Client<Self::Stream>;

    // -------------------------------------------------------------------------
    // Per-variant operations
    // -------------------------------------------------------------------------

    /// Value under `key`, or `KeyNotFound`
    fn get(&self, key: &[u8]) -> Result<Self::Value>;

    /// Unconditionally store `value` under `key`
    fn set(&self, key: &[u8], value: &Self::Value) -> Result<()>;

    /// Store `value` if `key` is absent; return whatever is stored afterwards
    fn setdefault(&self, key: &[u8], value: Self::Value) -> Result<Self::Value>;

    /// Values for `keys` in request order; `None` where the server had none
    fn multi_get(&self, keys: &[Vec<u8>], no_update_log: bool) -> Result<Vec<Option<Self::Value>>>;

    /// Store every pair in one round trip
    fn multi_set<I, K>(&self, items: I, no_update_log: bool) -> Result<()>
    where
        I: IntoIterator<Item = (K, Self::Value)>,
        K: AsRef<[u8]>;

    /// Append to the stored value, optionally keeping only the last `width` bytes
    fn concat(&self, key: &[u8], value: &Self::Value, width: Option<u32>) -> Result<()>;

    // -------------------------------------------------------------------------
    // Shared operations
    // -------------------------------------------------------------------------

    fn contains(&self, key: &[u8]) -> Result<bool> {
        match self.client().vsiz(key) {
            Ok(_) => Ok(true),
            Err(TyrantError::Protocol(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Delete `key`, or `KeyNotFound`
    fn remove(&self, key: &[u8]) -> Result<()> {
        self.client().out(key).map_err(missing_key(key))
    }

    /// Number of records
    fn len(&self) -> Result<u64> {
        self.client().rnum()
    }

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Delete every record
    fn clear(&self) -> Result<()> {
        self.client().vanish()
    }

    /// Forward-only iterator over every key
    ///
    /// Resets the server-side cursor, so two live iterators on one connection
    /// share (and disturb) the same position.
    fn keys(&self) -> Result<Keys<'_, Self::Stream>> {
        self.client().iterinit()?;
        Ok(Keys {
            client: self.client(),
            done: false,
        })
    }

    fn keys_vec(&self) -> Result<Vec<Vec<u8>>> {
        self.keys()?.collect()
    }

    /// Store every pair, from a map or from a pair sequence
    fn update<I, K>(&self, items: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, Self::Value)>,
        K: AsRef<[u8]>,
    {
        self.multi_set(items, false)
    }

    /// Delete every key in one round trip
    fn multi_del(&self, keys: &[Vec<u8>], no_update_log: bool) -> Result<()> {
        self.client()
            .bulk(&BulkCall::OutList { keys }, MiscOptions::update_log(no_update_log))?;
        Ok(())
    }

    /// Size of the stored value, or `KeyNotFound`
    fn get_size(&self, key: &[u8]) -> Result<u32> {
        self.client().vsiz(key).map_err(missing_key(key))
    }

    /// Keys starting with `prefix`, at most `max_keys` (default: all)
    fn prefix_keys(&self, prefix: &[u8], max_keys: Option<u32>) -> Result<Vec<Vec<u8>>> {
        let max = match max_keys {
            Some(max) => max,
            None => u32::try_from(self.len()?).unwrap_or(u32::MAX),
        };
        self.client().fwmkeys(prefix, max)
    }

    /// Run the server-side extension `function`
    fn call_func(
        &self,
        function: &str,
        key: &[u8],
        value: &[u8],
        record_locking: bool,
        global_locking: bool,
    ) -> Result<Vec<u8>> {
        let mut options = ExtOptions::NONE;
        if record_locking {
            options = options | ExtOptions::LOCK_RECORD;
        }
        if global_locking {
            options = options | ExtOptions::LOCK_GLOBAL;
        }
        self.client().ext(function, options, key, value)
    }

    /// Server statistics, one entry per `name\tvalue` line
    fn get_stats(&self) -> Result<BTreeMap<String, String>> {
        parse_stats(&self.client().stat()?)
    }

    fn sync(&self) -> Result<()> {
        self.client().sync()
    }
}

/// Iterator over every key, ending when the server reports exhaustion
pub struct Keys<'a, S: Read + Write> {
    client: &'a Client<S>,
    done: bool,
}

impl<S: Read + Write> Iterator for Keys<'_, S> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.client.iternext() {
            Ok(key) => Some(Ok(key)),
            // End of the key space is signalled as a failure status
            Err(TyrantError::Protocol(code)) => {
                tracing::trace!("Key iteration finished (status {})", code);
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Map a protocol failure on a single-key call to `KeyNotFound`
pub(crate) fn missing_key(key: &[u8]) -> impl FnOnce(TyrantError) -> TyrantError + '_ {
    move |err| match err {
        TyrantError::Protocol(_) => TyrantError::KeyNotFound(key.to_vec()),
        other => other,
    }
}

/// Decode a `getlist` reply into one optional value per requested key
///
/// Two layouts exist. Older servers return exactly one value per key in
/// request order; newer ones return interleaved key/value pairs for the keys
/// they found, in any order. With `GetListShape::Auto` the layout is inferred
/// from the field count: more fields than keys means interleaved, the same
/// count means legacy, and fewer is an unusable legacy reply.
pub fn decode_getlist(
    shape: GetListShape,
    keys: &[Vec<u8>],
    fields: Vec<Vec<u8>>,
) -> Result<Vec<Option<Vec<u8>>>> {
    let interleaved = match shape {
        GetListShape::Legacy => false,
        GetListShape::Interleaved => true,
        GetListShape::Auto => fields.len() > keys.len(),
    };

    if !interleaved {
        tracing::debug!("Decoding getlist reply as legacy ({} fields)", fields.len());
        if fields.len() < keys.len() {
            return Err(TyrantError::UnusableResponse(format!(
                "getlist returned {} values for {} keys",
                fields.len(),
                keys.len()
            )));
        }
        if fields.len() > keys.len() {
            return Err(TyrantError::MalformedResponse(format!(
                "getlist returned {} values for {} keys",
                fields.len(),
                keys.len()
            )));
        }
        return Ok(fields.into_iter().map(Some).collect());
    }

    tracing::debug!("Decoding getlist reply as interleaved ({} fields)", fields.len());
    if fields.len() % 2 != 0 {
        return Err(TyrantError::MalformedResponse(format!(
            "interleaved getlist reply has odd field count {}",
            fields.len()
        )));
    }

    let mut by_key = HashMap::with_capacity(fields.len() / 2);
    let mut fields = fields.into_iter();
    while let (Some(key), Some(value)) = (fields.next(), fields.next()) {
        by_key.insert(key, value);
    }

    Ok(keys.iter().map(|key| by_key.get(key).cloned()).collect())
}

fn parse_stats(report: &[u8]) -> Result<BTreeMap<String, String>> {
    let text = String::from_utf8_lossy(report);
    let mut stats = BTreeMap::new();

    for line in text.lines().filter(|l| !l.is_empty()) {
        let (name, value) = line.split_once('\t').ok_or_else(|| {
            TyrantError::MalformedResponse(format!("stat line without a tab: {:?}", line))
        })?;
        stats.insert(name.to_string(), value.to_string());
    }

    Ok(stats)
}
