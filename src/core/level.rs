//! Log levels and level masks
//!
//! A [`LogLevel`] is the severity of one message and is always atomic. A
//! [`LevelMask`] is the set of levels a logger is concerned with; composites
//! such as [`LevelMask::WARN_AND_ABOVE`] only ever appear on this side.

use crate::error::EasyLogError;
use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};
use std::str::FromStr;

/// Severity of a single log call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Verbose = 1,
    Debug = 2,
    Info = 4,
    Warn = 8,
    Error = 16,
}

impl LogLevel {
    /// All atomic levels, lowest first
    pub const ALL: [LogLevel; 5] = [
        LogLevel::Verbose,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
    ];

    /// Bit value of this level
    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// Upper-case name, e.g. `VERBOSE`
    pub const fn name(self) -> &'static str {
        match self {
            LogLevel::Verbose => "VERBOSE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    /// First letter of the name, used by the short tags
    pub const fn initial(self) -> char {
        match self {
            LogLevel::Verbose => 'V',
            LogLevel::Debug => 'D',
            LogLevel::Info => 'I',
            LogLevel::Warn => 'W',
            LogLevel::Error => 'E',
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LogLevel {
    type Err = EasyLogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "VERBOSE" => Ok(LogLevel::Verbose),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            _ => Err(EasyLogError::InvalidLogLevel(s.to_string())),
        }
    }
}

/// Bit set of concerned levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LevelMask(u8);

impl LevelMask {
    pub const NONE: LevelMask = LevelMask(0);
    pub const VERBOSE: LevelMask = LevelMask(LogLevel::Verbose.bits());
    pub const DEBUG: LevelMask = LevelMask(LogLevel::Debug.bits());
    pub const INFO: LevelMask = LevelMask(LogLevel::Info.bits());
    pub const WARN: LevelMask = LevelMask(LogLevel::Warn.bits());
    pub const ERROR: LevelMask = LevelMask(LogLevel::Error.bits());
    pub const WARN_AND_ABOVE: LevelMask = Self::WARN.union(Self::ERROR);
    pub const INFO_AND_ABOVE: LevelMask = Self::INFO.union(Self::WARN_AND_ABOVE);
    pub const DEBUG_AND_ABOVE: LevelMask = Self::DEBUG.union(Self::INFO_AND_ABOVE);
    pub const ALL: LevelMask = Self::VERBOSE.union(Self::DEBUG_AND_ABOVE);

    /// Named masks, largest value first. Display walks this table greedily.
    const NAMED: [(LevelMask, &'static str); 9] = [
        (Self::ALL, "ALL"),
        (Self::DEBUG_AND_ABOVE, "DEBUG_AND_ABOVE"),
        (Self::INFO_AND_ABOVE, "INFO_AND_ABOVE"),
        (Self::WARN_AND_ABOVE, "WARN_AND_ABOVE"),
        (Self::ERROR, "ERROR"),
        (Self::WARN, "WARN"),
        (Self::INFO, "INFO"),
        (Self::DEBUG, "DEBUG"),
        (Self::VERBOSE, "VERBOSE"),
    ];

    /// Build a mask from raw bits; bits outside the five levels are dropped.
    pub const fn from_bits(bits: u8) -> Self {
        LevelMask(bits & Self::ALL.0)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Bitwise OR of two masks
    pub const fn union(self, other: LevelMask) -> LevelMask {
        LevelMask(self.0 | other.0)
    }

    /// True iff `level & self` is non-zero
    pub const fn matches(self, level: LogLevel) -> bool {
        self.0 & level.bits() != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Levels contained in this mask, lowest first
    pub fn levels(self) -> impl Iterator<Item = LogLevel> {
        LogLevel::ALL.into_iter().filter(move |l| self.matches(*l))
    }
}

/// Free-function form of [`LevelMask::matches`].
pub const fn matches(level: LogLevel, mask: LevelMask) -> bool {
    mask.matches(level)
}

/// Free-function form of [`LevelMask::union`].
pub const fn union(a: LevelMask, b: LevelMask) -> LevelMask {
    a.union(b)
}

impl From<LogLevel> for LevelMask {
    fn from(level: LogLevel) -> Self {
        LevelMask(level.bits())
    }
}

impl BitOr for LevelMask {
    type Output = LevelMask;

    fn bitor(self, rhs: LevelMask) -> LevelMask {
        self.union(rhs)
    }
}

impl BitOr<LogLevel> for LevelMask {
    type Output = LevelMask;

    fn bitor(self, rhs: LogLevel) -> LevelMask {
        self.union(rhs.into())
    }
}

impl BitOr for LogLevel {
    type Output = LevelMask;

    fn bitor(self, rhs: LogLevel) -> LevelMask {
        LevelMask::from(self).union(rhs.into())
    }
}

impl BitOr<LevelMask> for LogLevel {
    type Output = LevelMask;

    fn bitor(self, rhs: LevelMask) -> LevelMask {
        LevelMask::from(self).union(rhs)
    }
}

impl BitOrAssign for LevelMask {
    fn bitor_assign(&mut self, rhs: LevelMask) {
        self.0 |= rhs.0;
    }
}

impl BitAnd<LogLevel> for LevelMask {
    type Output = bool;

    fn bitand(self, rhs: LogLevel) -> bool {
        self.matches(rhs)
    }
}

impl fmt::Display for LevelMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("NONE");
        }
        let mut remaining = self.0;
        let mut names = Vec::new();
        for (mask, name) in Self::NAMED {
            if remaining & mask.0 == mask.0 {
                names.push(name);
                remaining &= !mask.0;
            }
            if remaining == 0 {
                break;
            }
        }
        names.reverse();
        f.write_str(&names.join(", "))
    }
}

impl FromStr for LevelMask {
    type Err = EasyLogError;

    /// Parses names joined by `|` or `,`, e.g. `"VERBOSE | WARN_AND_ABOVE"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut mask = LevelMask::NONE;
        for part in s.split(['|', ',']) {
            let name = part.trim().to_uppercase();
            if name == "NONE" {
                continue;
            }
            let named = Self::NAMED
                .iter()
                .find(|(_, n)| *n == name)
                .map(|(m, _)| *m)
                .ok_or_else(|| EasyLogError::InvalidLogLevel(s.to_string()))?;
            mask |= named;
        }
        Ok(mask)
    }
}
