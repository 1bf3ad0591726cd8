//! Command definitions
//!
//! Represents requests sent to the server.

use std::ops::BitOr;

/// Opcodes of the binary protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    Put = 0x10,
    PutKeep = 0x11,
    PutCat = 0x12,
    PutShl = 0x13,
    PutNr = 0x18,
    Out = 0x20,
    Get = 0x30,
    Mget = 0x31,
    Vsiz = 0x38,
    IterInit = 0x50,
    IterNext = 0x51,
    FwmKeys = 0x58,
    AddInt = 0x60,
    AddDouble = 0x61,
    Ext = 0x68,
    Sync = 0x70,
    Vanish = 0x71,
    Copy = 0x72,
    Restore = 0x73,
    SetMst = 0x78,
    Rnum = 0x80,
    Size = 0x81,
    Stat = 0x88,
    Misc = 0x90,
}

/// Options for the `misc` call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MiscOptions(u32);

impl MiscOptions {
    pub const NONE: MiscOptions = MiscOptions(0);

    /// Do not write the operation to the update log
    pub const NO_UPDATE_LOG: MiscOptions = MiscOptions(1 << 0);

    pub fn bits(self) -> u32 {
        self.0
    }

    /// `NO_UPDATE_LOG` when `no_update_log` is set, otherwise empty
    pub fn update_log(no_update_log: bool) -> Self {
        if no_update_log {
            Self::NO_UPDATE_LOG
        } else {
            Self::NONE
        }
    }
}

impl BitOr for MiscOptions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        MiscOptions(self.0 | rhs.0)
    }
}

/// Options for the `ext` call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExtOptions(u32);

impl ExtOptions {
    pub const NONE: ExtOptions = ExtOptions(0);

    /// Lock the record while the script runs
    pub const LOCK_RECORD: ExtOptions = ExtOptions(1 << 0);

    /// Lock the whole database while the script runs
    pub const LOCK_GLOBAL: ExtOptions = ExtOptions(1 << 1);

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: ExtOptions) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for ExtOptions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        ExtOptions(self.0 | rhs.0)
    }
}

/// A request frame, borrowing its fields from the caller
#[derive(Debug, Clone, Copy)]
pub enum Command<'a> {
    Put { key: &'a [u8], value: &'a [u8] },
    PutKeep { key: &'a [u8], value: &'a [u8] },
    PutCat { key: &'a [u8], value: &'a [u8] },
    PutShl { key: &'a [u8], value: &'a [u8], width: u32 },
    PutNr { key: &'a [u8], value: &'a [u8] },
    Out { key: &'a [u8] },
    Get { key: &'a [u8] },
    Mget { keys: &'a [Vec<u8>] },
    Vsiz { key: &'a [u8] },
    IterInit,
    IterNext,
    FwmKeys { prefix: &'a [u8], max: u32 },
    AddInt { key: &'a [u8], num: i32 },
    AddDouble { key: &'a [u8], num: f64 },
    Ext { function: &'a str, options: ExtOptions, key: &'a [u8], value: &'a [u8] },
    Sync,
    Vanish,
    Copy { path: &'a [u8] },
    Restore { path: &'a [u8], timestamp_ms: u64 },
    SetMst { host: &'a [u8], port: u32 },
    Rnum,
    Size,
    Stat,
    Misc { function: &'a str, options: MiscOptions, args: &'a [Vec<u8>] },
}

impl Command<'_> {
    /// Get the opcode
    pub fn opcode(&self) -> Opcode {
        match self {
            Command::Put { .. } => Opcode::Put,
            Command::PutKeep { .. } => Opcode::PutKeep,
            Command::PutCat { .. } => Opcode::PutCat,
            Command::PutShl { .. } => Opcode::PutShl,
            Command::PutNr { .. } => Opcode::PutNr,
            Command::Out { .. } => Opcode::Out,
            Command::Get { .. } => Opcode::Get,
            Command::Mget { .. } => Opcode::Mget,
            Command::Vsiz { .. } => Opcode::Vsiz,
            Command::IterInit => Opcode::IterInit,
            Command::IterNext => Opcode::IterNext,
            Command::FwmKeys { .. } => Opcode::FwmKeys,
            Command::AddInt { .. } => Opcode::AddInt,
            Command::AddDouble { .. } => Opcode::AddDouble,
            Command::Ext { .. } => Opcode::Ext,
            Command::Sync => Opcode::Sync,
            Command::Vanish => Opcode::Vanish,
            Command::Copy { .. } => Opcode::Copy,
            Command::Restore { .. } => Opcode::Restore,
            Command::SetMst { .. } => Opcode::SetMst,
            Command::Rnum => Opcode::Rnum,
            Command::Size => Opcode::Size,
            Command::Stat => Opcode::Stat,
            Command::Misc { .. } => Opcode::Misc,
        }
    }

    /// Whether the server answers this command at all
    pub fn expects_reply(&self) -> bool {
        !matches!(self, Command::PutNr { .. })
    }

    /// Whether a failed reply still carries the 4-byte record count
    pub fn count_follows_failure(&self) -> bool {
        matches!(self, Command::Misc { .. })
    }
}
