//! Query Module
//!
//! Lazy table searches. A [`Query`] is an immutable list of conditions plus a
//! result cache. Deriving a query (`filter`, `order_by_*`) copies the list,
//! appends to the copy, and starts with an empty cache; the parent is never
//! touched. Everything compiles to one `search` bulk call.
//!
//! ```no_run
//! use tyrantkv::{Config, TableStore};
//!
//! let table = TableStore::open(&Config::default())?;
//! let adults = table
//!     .search()
//!     .filter("age__numge", 18)?
//!     .order_by_str("-name");
//!
//! for key in adults.slice(0..10)? {
//!     println!("{}", String::from_utf8_lossy(&key));
//! }
//! # Ok::<(), tyrantkv::TyrantError>(())
//! ```

use std::fmt;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::ops::{Range, RangeFrom, RangeFull, RangeTo};

use once_cell::unsync::OnceCell;

use crate::bulk::BulkCall;
use crate::error::{Result, TyrantError};
use crate::mapping::{Record, RecordMap, TableStore};
use crate::protocol::MiscOptions;

mod condition;

pub use condition::{Condition, QueryOp, SortOrder};

/// Separator between column and operation in filter names
const FILTER_NAME_SEPARATOR: &str = "__";

/// A lazily evaluated search over a table
pub struct Query<'a, S: Read + Write = TcpStream> {
    table: &'a TableStore<S>,
    conditions: Vec<Condition>,
    cache: OnceCell<Vec<Vec<u8>>>,
}

impl<'a, S: Read + Write> Query<'a, S> {
    pub(crate) fn new(table: &'a TableStore<S>) -> Self {
        Self {
            table,
            conditions: Vec::new(),
            cache: OnceCell::new(),
        }
    }

    /// Conditions in the order they will be sent
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Whether the full key list has been fetched
    pub fn is_cached(&self) -> bool {
        self.cache.get().is_some()
    }

    fn derive(&self, extra: impl IntoIterator<Item = Condition>) -> Self {
        let mut conditions = self.conditions.clone();
        conditions.extend(extra);
        Self {
            table: self.table,
            conditions,
            cache: OnceCell::new(),
        }
    }

    // =========================================================================
    // Derivation
    // =========================================================================

    /// Add one `column__operation` filter, e.g. `("name__strbw", "A")`
    pub fn filter(&self, name: &str, value: impl Into<FilterValue>) -> Result<Self> {
        self.filter_all([(name, value)])
    }

    /// Add several filters at once; any invalid name rejects them all
    pub fn filter_all<I, K, V>(&self, filters: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<FilterValue>,
    {
        let conditions = filters
            .into_iter()
            .map(|(name, value)| {
                let (column, op) = parse_filter_name(name.as_ref())?;
                Ok(Condition::AddCond {
                    column: column.to_string(),
                    op,
                    operand: value.into().0,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(self.derive(conditions))
    }

    /// Add a filter with an explicit operation
    pub fn filter_op(&self, column: &str, op: QueryOp, value: impl Into<FilterValue>) -> Self {
        self.derive([Condition::AddCond {
            column: column.to_string(),
            op,
            operand: value.into().0,
        }])
    }

    /// Sort numerically by `column`; a leading `-` sorts descending
    pub fn order_by_num(&self, column: &str) -> Self {
        match column.strip_prefix('-') {
            Some(column) => self.order(column, SortOrder::NumDesc),
            None => self.order(column, SortOrder::NumAsc),
        }
    }

    /// Sort lexically by `column`; a leading `-` sorts descending
    pub fn order_by_str(&self, column: &str) -> Self {
        match column.strip_prefix('-') {
            Some(column) => self.order(column, SortOrder::StrDesc),
            None => self.order(column, SortOrder::StrAsc),
        }
    }

    fn order(&self, column: &str, order: SortOrder) -> Self {
        self.derive([Condition::SetOrder {
            column: column.to_string(),
            order,
        }])
    }

    // =========================================================================
    // Evaluation
    // =========================================================================

    /// Every matching key, fetched once and cached
    pub fn keys(&self) -> Result<&[Vec<u8>]> {
        let keys = self.cache.get_or_try_init(|| self.search(None))?;
        Ok(keys.as_slice())
    }

    /// Number of matching keys
    pub fn count(&self) -> Result<usize> {
        Ok(self.keys()?.len())
    }

    /// The key at `index`, or `None` past the end
    ///
    /// Without a cached result this fetches just one key at that offset.
    pub fn get(&self, index: isize) -> Result<Option<Vec<u8>>> {
        let index = non_negative(index, "index")?;

        if let Some(keys) = self.cache.get() {
            return Ok(keys.get(index).cloned());
        }

        let found = self.search(Some(Condition::SetLimit {
            limit: 1,
            offset: index as u64,
        }))?;
        Ok(found.into_iter().next())
    }

    /// Keys in `slice`, fetched as one bounded search
    ///
    /// A step is applied locally to the fetched window.
    pub fn slice(&self, slice: impl Into<QuerySlice>) -> Result<Vec<Vec<u8>>> {
        let slice = slice.into();
        let start = match slice.start {
            Some(start) => non_negative(start, "slice start")?,
            None => 0,
        };
        let stop = match slice.stop {
            Some(stop) => Some(non_negative(stop, "slice stop")?),
            None => None,
        };
        let step = match slice.step {
            Some(0) => return Err(TyrantError::InvalidQuery("slice step cannot be zero".to_string())),
            Some(step) => step,
            None => 1,
        };

        if matches!(stop, Some(stop) if stop <= start) {
            return Ok(Vec::new());
        }

        let window = match self.cache.get() {
            Some(keys) => {
                let end = stop.unwrap_or(keys.len()).min(keys.len());
                keys[start.min(end)..end].to_vec()
            }
            None => {
                let limit = match stop {
                    Some(stop) => (stop - start) as i64,
                    None => -1,
                };
                self.search(Some(Condition::SetLimit {
                    limit,
                    offset: start as u64,
                }))?
            }
        };

        Ok(window.into_iter().step_by(step).collect())
    }

    /// Matching keys paired with their records, via one bulk get
    pub fn items(&self) -> Result<Vec<(Vec<u8>, Option<Record>)>> {
        let keys = self.keys()?;
        let records = self.table.multi_get(keys, false)?;
        Ok(keys.iter().cloned().zip(records).collect())
    }

    fn search(&self, limit: Option<Condition>) -> Result<Vec<Vec<u8>>> {
        let conditions: Vec<Condition> = match limit {
            Some(limit) => self.conditions.iter().cloned().chain([limit]).collect(),
            None => self.conditions.clone(),
        };
        tracing::trace!("Searching with {} conditions", conditions.len());

        self.table
            .client()
            .bulk(&BulkCall::Search { conditions: &conditions }, MiscOptions::NONE)
    }
}

impl<S: Read + Write> fmt::Debug for Query<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("conditions", &self.conditions)
            .field("cached", &self.cache.get().map(Vec::len))
            .finish()
    }
}

fn parse_filter_name(name: &str) -> Result<(&str, QueryOp)> {
    let mut parts = name.split(FILTER_NAME_SEPARATOR);
    let (column, op_name) = match (parts.next(), parts.next(), parts.next()) {
        (Some(column), Some(op_name), None) => (column, op_name),
        _ => {
            return Err(TyrantError::InvalidQuery(format!(
                "filter {:?} should be of the form `column__operation`",
                name
            )))
        }
    };

    let op = QueryOp::from_name(op_name).ok_or_else(|| {
        TyrantError::InvalidQuery(format!("{} is not a valid query operation", op_name))
    })?;
    Ok((column, op))
}

fn non_negative(n: isize, what: &str) -> Result<usize> {
    usize::try_from(n).map_err(|_| {
        TyrantError::InvalidQuery(format!("negative {} {} is not supported", what, n))
    })
}

// =============================================================================
// Filter operands
// =============================================================================

/// Right-hand side of a filter; lists are sent comma separated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterValue(String);

impl FilterValue {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue(value)
    }
}

impl From<&String> for FilterValue {
    fn from(value: &String) -> Self {
        FilterValue(value.clone())
    }
}

impl<T: AsRef<str>> From<Vec<T>> for FilterValue {
    fn from(values: Vec<T>) -> Self {
        Self::from(values.as_slice())
    }
}

impl<T: AsRef<str>> From<&[T]> for FilterValue {
    fn from(values: &[T]) -> Self {
        let parts: Vec<&str> = values.iter().map(|v| v.as_ref()).collect();
        FilterValue(parts.join(","))
    }
}

impl<T: AsRef<str>, const N: usize> From<[T; N]> for FilterValue {
    fn from(values: [T; N]) -> Self {
        Self::from(&values[..])
    }
}

macro_rules! filter_value_from_number {
    ($($ty:ty),*) => {
        $(impl From<$ty> for FilterValue {
            fn from(value: $ty) -> Self {
                FilterValue(value.to_string())
            }
        })*
    };
}

filter_value_from_number!(i32, i64, u32, u64, usize, f64);

// =============================================================================
// Slices
// =============================================================================

/// Python-style `[start:stop:step]` window over query results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QuerySlice {
    pub start: Option<isize>,
    pub stop: Option<isize>,
    pub step: Option<usize>,
}

impl QuerySlice {
    pub fn new(start: Option<isize>, stop: Option<isize>) -> Self {
        Self { start, stop, step: None }
    }

    pub fn step(mut self, step: usize) -> Self {
        self.step = Some(step);
        self
    }
}

impl From<Range<isize>> for QuerySlice {
    fn from(range: Range<isize>) -> Self {
        Self::new(Some(range.start), Some(range.end))
    }
}

impl From<RangeFrom<isize>> for QuerySlice {
    fn from(range: RangeFrom<isize>) -> Self {
        Self::new(Some(range.start), None)
    }
}

impl From<RangeTo<isize>> for QuerySlice {
    fn from(range: RangeTo<isize>) -> Self {
        Self::new(None, Some(range.end))
    }
}

impl From<RangeFull> for QuerySlice {
    fn from(_: RangeFull) -> Self {
        Self::default()
    }
}
