//! Identifiers shared by every component: who a timer belongs to, what role
//! it plays, and how important its reminder is.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::constants::KEY_SEPARATOR;
use crate::Result;
use crate::TimerError;

/// Role of a countdown for its owner. One owner runs at most one timer per
/// kind at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    Wash,
    Dry,
    Fold,
    Recurrence,
}

impl TimerKind {
    pub const ALL: [TimerKind; 4] = [
        TimerKind::Wash,
        TimerKind::Dry,
        TimerKind::Fold,
        TimerKind::Recurrence,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimerKind::Wash => "wash",
            TimerKind::Dry => "dry",
            TimerKind::Fold => "fold",
            TimerKind::Recurrence => "recurrence",
        }
    }
}

impl fmt::Display for TimerKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimerKind {
    type Err = TimerError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        TimerKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| TimerError::UnknownKind(s.to_string()))
    }
}

/// Reminder importance. Only consulted when the notification budget is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Priority {
    Low = 0,
    Medium = 1,
    High = 2,
    Critical = 3,
}

impl Priority {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Priority::Low),
            1 => Some(Priority::Medium),
            2 => Some(Priority::High),
            3 => Some(Priority::Critical),
            _ => None,
        }
    }
}

/// `(owner_id, kind)`: the persistence key and the notification id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerKey {
    owner_id: String,
    kind: TimerKind,
}

impl TimerKey {
    /// Builds a key, rejecting blank owner ids.
    pub fn new(
        owner_id: impl Into<String>,
        kind: TimerKind,
    ) -> Result<Self> {
        let owner_id = owner_id.into();
        if owner_id.trim().is_empty() {
            return Err(TimerError::InvalidOwnerId(owner_id).into());
        }
        Ok(Self { owner_id, kind })
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn kind(&self) -> TimerKind {
        self.kind
    }

    /// Prefix matching every kind of one owner in the store.
    pub fn owner_prefix(owner_id: &str) -> String {
        format!("{owner_id}{KEY_SEPARATOR}")
    }

    /// Parses `<owner_id>:<kind>`, splitting at the last separator so owner
    /// ids may themselves contain `:`.
    pub fn parse(s: &str) -> Result<Self> {
        let (owner_id, kind) = s
            .rsplit_once(KEY_SEPARATOR)
            .ok_or_else(|| TimerError::InvalidKey(s.to_string()))?;
        let kind = TimerKind::from_str(kind)?;
        Self::new(owner_id, kind)
    }
}

impl fmt::Display for TimerKey {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}{}{}", self.owner_id, KEY_SEPARATOR, self.kind)
    }
}

impl FromStr for TimerKey {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        TimerKey::parse(s)
    }
}
