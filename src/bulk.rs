//! Bulk calls
//!
//! The `misc` opcode takes a function name and a flat argument list. Each
//! function the server knows is one `BulkCall` variant, so callers never build
//! the name or the argument list by hand. The wire encoding is unchanged.
//!
//! | Function   | Databases | Arguments                          | Reply              |
//! |------------|-----------|------------------------------------|--------------------|
//! | `putlist`  | all       | key, value, key, value, ...        | empty              |
//! | `outlist`  | all       | keys                               | empty              |
//! | `getlist`  | all       | keys                               | values (see below) |
//! | `put`      | table     | key, column, value, ...            | empty              |
//! | `putkeep`  | table     | key, column, value, ...            | empty              |
//! | `putcat`   | table     | key, column, value, ...            | empty              |
//! | `get`      | table     | key                                | column, value, ... |
//! | `search`   | table     | encoded conditions                 | keys               |
//! | `setindex` | table     | column, index type                 | empty              |
//! | `genuid`   | table     | (none)                             | one decimal uid    |

use crate::mapping::Record;
use crate::query::Condition;

/// Flag OR'd into an index type to keep an existing index
pub const INDEX_KEEP: u32 = 1 << 24;

/// Column index kinds for `setindex`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum IndexType {
    /// String index
    Lexical = 0,
    /// Numeric index
    Decimal = 1,
    /// Token inverted index
    Token = 2,
    /// Q-gram inverted index
    QGram = 3,
    /// Optimize an existing index
    Optimize = 9998,
    /// Remove an index
    Void = 9999,
}

/// One typed `misc` request
#[derive(Debug, Clone, Copy)]
pub enum BulkCall<'a> {
    PutList { pairs: &'a [(Vec<u8>, Vec<u8>)] },
    OutList { keys: &'a [Vec<u8>] },
    GetList { keys: &'a [Vec<u8>] },
    Put { key: &'a [u8], record: &'a Record },
    PutKeep { key: &'a [u8], record: &'a Record },
    PutCat { key: &'a [u8], record: &'a Record },
    Get { key: &'a [u8] },
    Search { conditions: &'a [Condition] },
    SetIndex { column: &'a str, kind: IndexType, keep: bool },
    GenUid,
}

impl BulkCall<'_> {
    /// Function name sent on the wire
    pub fn function(&self) -> &'static str {
        match self {
            BulkCall::PutList { .. } => "putlist",
            BulkCall::OutList { .. } => "outlist",
            BulkCall::GetList { .. } => "getlist",
            BulkCall::Put { .. } => "put",
            BulkCall::PutKeep { .. } => "putkeep",
            BulkCall::PutCat { .. } => "putcat",
            BulkCall::Get { .. } => "get",
            BulkCall::Search { .. } => "search",
            BulkCall::SetIndex { .. } => "setindex",
            BulkCall::GenUid => "genuid",
        }
    }

    /// Flat argument list sent on the wire
    pub fn args(&self) -> Vec<Vec<u8>> {
        match *self {
            BulkCall::PutList { pairs } => {
                let mut args = Vec::with_capacity(pairs.len() * 2);
                for (key, value) in pairs {
                    args.push(key.clone());
                    args.push(value.clone());
                }
                args
            }
            BulkCall::OutList { keys } | BulkCall::GetList { keys } => keys.to_vec(),
            BulkCall::Put { key, record }
            | BulkCall::PutKeep { key, record }
            | BulkCall::PutCat { key, record } => {
                let mut args = Vec::with_capacity(1 + record.len() * 2);
                args.push(key.to_vec());
                args.extend(record.to_flat());
                args
            }
            BulkCall::Get { key } => vec![key.to_vec()],
            BulkCall::Search { conditions } => conditions.iter().map(Condition::encode).collect(),
            BulkCall::SetIndex { column, kind, keep } => {
                let mut code = kind as u32;
                if keep {
                    code |= INDEX_KEEP;
                }
                vec![column.as_bytes().to_vec(), code.to_string().into_bytes()]
            }
            BulkCall::GenUid => Vec::new(),
        }
    }
}
