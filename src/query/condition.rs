//! Query conditions
//!
//! Each condition travels as one `search` argument: string tokens joined with
//! zero bytes.
//! ```text
//! addcond  \0 column \0 op-code \0 operand
//! setorder \0 column \0 order-code
//! setlimit \0 limit  \0 offset
//! ```

use std::fmt;

/// Filter operations, by wire code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum QueryOp {
    /// string is equal to
    StrEq = 0,
    /// string is included in
    StrInc = 1,
    /// string begins with
    StrBw = 2,
    /// string ends with
    StrEw = 3,
    /// string includes all tokens in
    StrAnd = 4,
    /// string includes at least one token in
    StrOr = 5,
    /// string is equal to at least one token in
    StrOrEq = 6,
    /// string matches regular expression
    StrRx = 7,
    /// number is equal to
    NumEq = 8,
    /// number is greater than
    NumGt = 9,
    /// number is greater than or equal to
    NumGe = 10,
    /// number is less than
    NumLt = 11,
    /// number is less than or equal to
    NumLe = 12,
    /// number is between two tokens
    NumBt = 13,
    /// number is equal to at least one token in
    NumOrEq = 14,
}

impl QueryOp {
    pub const ALL: [QueryOp; 15] = [
        QueryOp::StrEq,
        QueryOp::StrInc,
        QueryOp::StrBw,
        QueryOp::StrEw,
        QueryOp::StrAnd,
        QueryOp::StrOr,
        QueryOp::StrOrEq,
        QueryOp::StrRx,
        QueryOp::NumEq,
        QueryOp::NumGt,
        QueryOp::NumGe,
        QueryOp::NumLt,
        QueryOp::NumLe,
        QueryOp::NumBt,
        QueryOp::NumOrEq,
    ];

    /// Name used in `column__name` filter keys
    pub fn name(self) -> &'static str {
        match self {
            QueryOp::StrEq => "streq",
            QueryOp::StrInc => "strinc",
            QueryOp::StrBw => "strbw",
            QueryOp::StrEw => "strew",
            QueryOp::StrAnd => "strand",
            QueryOp::StrOr => "stror",
            QueryOp::StrOrEq => "stroreq",
            QueryOp::StrRx => "strrx",
            QueryOp::NumEq => "numeq",
            QueryOp::NumGt => "numgt",
            QueryOp::NumGe => "numge",
            QueryOp::NumLt => "numlt",
            QueryOp::NumLe => "numle",
            QueryOp::NumBt => "numbt",
            QueryOp::NumOrEq => "numoreq",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Result ordering, by wire code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SortOrder {
    StrAsc = 0,
    StrDesc = 1,
    NumAsc = 2,
    NumDesc = 3,
}

/// One directive of a table search
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Keep records whose `column` satisfies `op` against `operand`
    AddCond { column: String, op: QueryOp, operand: String },

    /// Sort by `column`
    SetOrder { column: String, order: SortOrder },

    /// Return at most `limit` keys (negative: no limit) after skipping `offset`
    SetLimit { limit: i64, offset: u64 },
}

impl Condition {
    /// Zero-byte-joined wire form
    pub fn encode(&self) -> Vec<u8> {
        let tokens: Vec<String> = match self {
            Condition::AddCond { column, op, operand } => vec![
                "addcond".to_string(),
                column.clone(),
                op.code().to_string(),
                operand.clone(),
            ],
            Condition::SetOrder { column, order } => vec![
                "setorder".to_string(),
                column.clone(),
                (*order as u8).to_string(),
            ],
            Condition::SetLimit { limit, offset } => vec![
                "setlimit".to_string(),
                limit.to_string(),
                offset.to_string(),
            ],
        };
        tokens.join("\0").into_bytes()
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::AddCond { column, op, operand } => {
                write!(f, "{}__{}={:?}", column, op.name(), operand)
            }
            Condition::SetOrder { column, order } => write!(f, "order {} {:?}", column, order),
            Condition::SetLimit { limit, offset } => write!(f, "limit {} offset {}", limit, offset),
        }
    }
}
