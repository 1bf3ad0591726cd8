//! Table records
//!
//! A record is an ordered list of (column name, column value) pairs with
//! unique names. On the wire it travels either flattened into separate
//! fields or, inside a single value slot, joined with zero bytes.

use crate::error::{Result, TyrantError};

/// Column separator inside one joined value slot
pub const COLUMN_SEPARATOR: u8 = 0x00;

/// One table record
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    columns: Vec<(Vec<u8>, Vec<u8>)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from pairs; a repeated name overwrites the earlier value in place
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        let mut record = Self::new();
        for (name, value) in pairs {
            record.insert(name, value);
        }
        record
    }

    /// Set a column, returning the previous value if the name existed
    pub fn insert(&mut self, name: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> Option<Vec<u8>> {
        let name = name.as_ref();
        let value = value.as_ref().to_vec();
        match self.columns.iter_mut().find(|(n, _)| n.as_slice() == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.columns.push((name.to_vec(), value));
                None
            }
        }
    }

    pub fn get(&self, name: impl AsRef<[u8]>) -> Option<&[u8]> {
        let name = name.as_ref();
        self.columns
            .iter()
            .find(|(n, _)| n.as_slice() == name)
            .map(|(_, v)| v.as_slice())
    }

    /// Column value as text, if present and valid UTF-8
    pub fn get_str(&self, name: impl AsRef<[u8]>) -> Option<&str> {
        self.get(name).and_then(|v| std::str::from_utf8(v).ok())
    }

    pub fn remove(&mut self, name: impl AsRef<[u8]>) -> Option<Vec<u8>> {
        let name = name.as_ref();
        let pos = self.columns.iter().position(|(n, _)| n.as_slice() == name)?;
        Some(self.columns.remove(pos).1)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8])> {
        self.columns.iter().map(|(n, v)| (n.as_slice(), v.as_slice()))
    }

    // =========================================================================
    // Wire forms
    // =========================================================================

    /// name, value, name, value, ... as separate fields
    pub fn to_flat(&self) -> Vec<Vec<u8>> {
        let mut out = Vec::with_capacity(self.columns.len() * 2);
        for (name, value) in &self.columns {
            out.push(name.clone());
            out.push(value.clone());
        }
        out
    }

    /// Inverse of [`Record::to_flat`]
    pub fn from_flat(fields: Vec<Vec<u8>>) -> Result<Self> {
        if fields.len() % 2 != 0 {
            return Err(TyrantError::MalformedResponse(format!(
                "record has {} fields, expected name/value pairs",
                fields.len()
            )));
        }

        let mut record = Self::new();
        let mut fields = fields.into_iter();
        while let (Some(name), Some(value)) = (fields.next(), fields.next()) {
            record.insert(name, value);
        }
        Ok(record)
    }

    /// All fields joined with zero bytes into one value slot
    ///
    /// Fails if any name or value itself contains a zero byte, since the
    /// joined form could not be split back apart.
    pub fn to_joined(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        for (i, field) in self.to_flat().into_iter().enumerate() {
            if field.contains(&COLUMN_SEPARATOR) {
                return Err(TyrantError::Unsupported(format!(
                    "column field {:?} contains a zero byte and cannot be joined",
                    String::from_utf8_lossy(&field)
                )));
            }
            if i > 0 {
                out.push(COLUMN_SEPARATOR);
            }
            out.extend_from_slice(&field);
        }
        Ok(out)
    }

    /// Inverse of [`Record::to_joined`]
    pub fn from_joined(joined: &[u8]) -> Result<Self> {
        if joined.is_empty() {
            return Ok(Self::new());
        }
        let fields = joined
            .split(|b| *b == COLUMN_SEPARATOR)
            .map(<[u8]>::to_vec)
            .collect();
        Self::from_flat(fields)
    }
}

impl<K: AsRef<[u8]>, V: AsRef<[u8]>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

impl IntoIterator for Record {
    type Item = (Vec<u8>, Vec<u8>);
    type IntoIter = std::vec::IntoIter<(Vec<u8>, Vec<u8>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.into_iter()
    }
}
