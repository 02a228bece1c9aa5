//! Trigger declarations.
//!
//! Triggers are declared per model and rendered into dialect-specific
//! `CREATE TRIGGER` statements by the loader. The body is opaque text.

use std::fmt;

use serde::{Deserialize, Serialize};

/// When the trigger fires relative to the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerTime {
    /// Before the row is written.
    #[serde(rename = "BEFORE")]
    Before,
    /// After the row is written.
    #[serde(rename = "AFTER")]
    After,
    /// In place of the event (views).
    #[serde(rename = "INSTEAD OF")]
    InsteadOf,
}

impl TriggerTime {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Before => "BEFORE",
            Self::After => "AFTER",
            Self::InsteadOf => "INSTEAD OF",
        }
    }
}

/// Statement kind the trigger fires on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TriggerEvent {
    /// INSERT.
    Insert,
    /// UPDATE.
    Update,
    /// DELETE.
    Delete,
    /// TRUNCATE.
    Truncate,
}

impl TriggerEvent {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Truncate => "TRUNCATE",
        }
    }
}

/// Granularity: once per row or once per statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TriggerFor {
    /// FOR EACH ROW.
    Row,
    /// FOR EACH STATEMENT.
    Statement,
}

impl TriggerFor {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Row => "ROW",
            Self::Statement => "STATEMENT",
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(TriggerTime, TriggerEvent, TriggerFor);

/// A trigger on a model's table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    /// Trigger name.
    pub name: String,
    /// BEFORE, AFTER or INSTEAD OF.
    pub action_time: TriggerTime,
    /// INSERT, UPDATE, DELETE or TRUNCATE.
    pub event: TriggerEvent,
    /// FOR EACH ROW or FOR EACH STATEMENT.
    #[serde(rename = "for")]
    pub for_each: TriggerFor,
    /// Trigger body only.
    pub body: String,
}

impl Trigger {
    /// Creates a row-level trigger.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        action_time: TriggerTime,
        event: TriggerEvent,
        body: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            action_time,
            event,
            for_each: TriggerFor::Row,
            body: body.into(),
        }
    }

    /// Sets the granularity.
    #[must_use]
    pub const fn for_each(mut self, for_each: TriggerFor) -> Self {
        self.for_each = for_each;
        self
    }
}
