//! Flat key/value store

use std::io::{Read, Write};
use std::net::TcpStream;

use crate::bulk::BulkCall;
use crate::client::Client;
use crate::config::Config;
use crate::error::{Result, TyrantError};
use crate::protocol::MiscOptions;

use super::{decode_getlist, missing_key, RecordMap};

/// Mapping over a database whose values are raw bytes
pub struct KvStore<S: Read + Write = TcpStream> {
    client: Client<S>,
}

impl KvStore<TcpStream> {
    /// Connect using `config`
    pub fn open(config: &Config) -> Result<Self> {
        Ok(Self::new(Client::open(config)?))
    }

    pub fn close(self) -> Result<()> {
        self.client.close()
    }
}

impl<S: Read + Write> KvStore<S> {
    pub fn new(client: Client<S>) -> Self {
        Self { client }
    }

    pub fn into_client(self) -> Client<S> {
        self.client
    }
}

impl<S: Read + Write> RecordMap for KvStore<S> {
    type Stream = S;
    type Value = Vec<u8>;

    fn client(&self) -> &Client<S> {
        &self.client
    }

    fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        self.client.get(key).map_err(missing_key(key))
    }

    fn set(&self, key: &[u8], value: &Vec<u8>) -> Result<()> {
        self.client.put(key, value)
    }

    fn setdefault(&self, key: &[u8], value: Vec<u8>) -> Result<Vec<u8>> {
        match self.client.putkeep(key, &value) {
            Ok(()) => Ok(value),
            Err(TyrantError::Protocol(_)) => self.get(key),
            Err(e) => Err(e),
        }
    }

    fn multi_get(&self, keys: &[Vec<u8>], no_update_log: bool) -> Result<Vec<Option<Vec<u8>>>> {
        let fields = self
            .client
            .bulk(&BulkCall::GetList { keys }, MiscOptions::update_log(no_update_log))?;
        decode_getlist(self.client.getlist_shape(), keys, fields)
    }

    fn multi_set<I, K>(&self, items: I, no_update_log: bool) -> Result<()>
    where
        I: IntoIterator<Item = (K, Vec<u8>)>,
        K: AsRef<[u8]>,
    {
        let pairs: Vec<(Vec<u8>, Vec<u8>)> = items
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_vec(), v))
            .collect();
        self.client
            .bulk(&BulkCall::PutList { pairs: &pairs }, MiscOptions::update_log(no_update_log))?;
        Ok(())
    }

    fn concat(&self, key: &[u8], value: &Vec<u8>, width: Option<u32>) -> Result<()> {
        match width {
            None => self.client.putcat(key, value),
            Some(width) => self.client.putshl(key, value, width),
        }
    }
}
