//! Table store
//!
//! Values are [`Record`]s. Single-record calls pass the columns as separate
//! `misc` arguments; `putlist`/`getlist` carry one joined record per value slot.

use std::io::{Read, Write};
use std::net::TcpStream;

use crate::bulk::{BulkCall, IndexType};
use crate::client::Client;
use crate::config::Config;
use crate::error::{Result, TyrantError};
use crate::protocol::MiscOptions;
use crate::query::Query;

use super::{decode_getlist, missing_key, Record, RecordMap};

/// Mapping over a table database
pub struct TableStore<S: Read + Write = TcpStream> {
    client: Client<S>,
}

impl TableStore<TcpStream> {
    /// Connect using `config`
    pub fn open(config: &Config) -> Result<Self> {
        Ok(Self::new(Client::open(config)?))
    }

    pub fn close(self) -> Result<()> {
        self.client.close()
    }
}

impl<S: Read + Write> TableStore<S> {
    pub fn new(client: Client<S>) -> Self {
        Self { client }
    }

    pub fn into_client(self) -> Client<S> {
        self.client
    }

    /// Start a query over every record
    pub fn search(&self) -> Query<'_, S> {
        Query::new(self)
    }

    /// Create, optimize or drop the index on `column`
    ///
    /// With `keep` set, an existing index is left alone and the call fails.
    pub fn set_index(&self, column: &str, kind: IndexType, keep: bool) -> Result<()> {
        self.client
            .bulk(&BulkCall::SetIndex { column, kind, keep }, MiscOptions::NONE)?;
        Ok(())
    }

    /// Fresh unique id for a primary key
    pub fn gen_uid(&self) -> Result<u64> {
        let reply = self.client.bulk(&BulkCall::GenUid, MiscOptions::NONE)?;
        let first = reply
            .first()
            .ok_or_else(|| TyrantError::MalformedResponse("genuid returned nothing".to_string()))?;

        std::str::from_utf8(first)
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .ok_or_else(|| {
                TyrantError::MalformedResponse(format!(
                    "genuid returned {:?}",
                    String::from_utf8_lossy(first)
                ))
            })
    }

    /// Store `record` if `key` is absent, with an explicit update-log choice
    pub fn setdefault_with_options(&self, key: &[u8], record: Record, no_update_log: bool) -> Result<Record> {
        let call = BulkCall::PutKeep { key, record: &record };
        match self.client.bulk(&call, MiscOptions::update_log(no_update_log)) {
            Ok(_) => Ok(record),
            Err(TyrantError::Protocol(_)) => self.get(key),
            Err(e) => Err(e),
        }
    }

    /// Merge `record`'s columns into the stored record
    pub fn concat_with_options(&self, key: &[u8], record: &Record, no_update_log: bool) -> Result<()> {
        self.client
            .bulk(&BulkCall::PutCat { key, record }, MiscOptions::update_log(no_update_log))?;
        Ok(())
    }
}

impl<S: Read + Write> RecordMap for TableStore<S> {
    type Stream = S;
    type Value = Record;

    fn client(&self) -> &Client<S> {
        &self.client
    }

    fn get(&self, key: &[u8]) -> Result<Record> {
        let fields = self
            .client
            .bulk(&BulkCall::Get { key }, MiscOptions::NONE)
            .map_err(missing_key(key))?;
        Record::from_flat(fields)
    }

    fn set(&self, key: &[u8], record: &Record) -> Result<()> {
        self.client.bulk(&BulkCall::Put { key, record }, MiscOptions::NONE)?;
        Ok(())
    }

    fn setdefault(&self, key: &[u8], record: Record) -> Result<Record> {
        self.setdefault_with_options(key, record, false)
    }

    fn multi_get(&self, keys: &[Vec<u8>], no_update_log: bool) -> Result<Vec<Option<Record>>> {
        let fields = self
            .client
            .bulk(&BulkCall::GetList { keys }, MiscOptions::update_log(no_update_log))?;

        decode_getlist(self.client.getlist_shape(), keys, fields)?
            .into_iter()
            .map(|value| value.map(|joined| Record::from_joined(&joined)).transpose())
            .collect()
    }

    fn multi_set<I, K>(&self, items: I, no_update_log: bool) -> Result<()>
    where
        I: IntoIterator<Item = (K, Record)>,
        K: AsRef<[u8]>,
    {
        let pairs = items
            .into_iter()
            .map(|(k, record)| Ok((k.as_ref().to_vec(), record.to_joined()?)))
            .collect::<Result<Vec<_>>>()?;

        self.client
            .bulk(&BulkCall::PutList { pairs: &pairs }, MiscOptions::update_log(no_update_log))?;
        Ok(())
    }

    /// Records have no byte width, so `width` must be `None`
    fn concat(&self, key: &[u8], record: &Record, width: Option<u32>) -> Result<()> {
        if width.is_some() {
            return Err(TyrantError::Unsupported(
                "cannot concat with a width on a table database".to_string(),
            ));
        }
        self.concat_with_options(key, record, false)
    }
}
