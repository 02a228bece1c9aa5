//! The driver seam between the ORM and whatever executes its SQL.
//!
//! A [`Driver`] hands out [`Connection`]s; the ORM never talks to anything
//! else. Drivers are looked up by name in a [`Drivers`] registry owned by the
//! caller, so two registries never share state.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::error::{OrmError, Result};

/// A value bound to a statement placeholder or returned in a row.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL NULL.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Unsigned integer.
    Uint(u64),
    /// Floating point.
    Float(f64),
    /// Text.
    String(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
}

impl Value {
    /// Returns the value as an integer count, if it is numeric or numeric text.
    #[must_use]
    pub fn as_count(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Uint(u) => i64::try_from(*u).ok(),
            Self::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Returns the value as text, if it is text.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// A result set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rows {
    /// Column names.
    pub columns: Vec<String>,
    /// Row data, one inner vector per row.
    pub data: Vec<Vec<Value>>,
}

impl Rows {
    /// Returns the first column of the first row.
    #[must_use]
    pub fn scalar(&self) -> Option<&Value> {
        self.data.first()?.first()
    }
}

/// An open connection.
pub trait Connection {
    /// Executes a statement that returns no rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection rejects the statement.
    fn exec(&mut self, sql: &str, args: &[Value]) -> Result<u64>;

    /// Runs a query and returns its rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection rejects the query.
    fn query(&mut self, sql: &str, args: &[Value]) -> Result<Rows>;
}

/// Opens connections from a data source name.
pub trait Driver {
    /// Opens a new connection to `dsn`.
    ///
    /// # Errors
    ///
    /// Returns an error if no connection can be opened for `dsn`.
    fn open(&self, dsn: &str) -> Result<Box<dyn Connection>>;
}

/// Registry of drivers by name.
#[derive(Clone, Default)]
pub struct Drivers {
    drivers: HashMap<String, Rc<dyn Driver>>,
}

impl Drivers {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `driver` under `name`, replacing any previous one.
    pub fn register(&mut self, name: impl Into<String>, driver: impl Driver + 'static) {
        self.drivers.insert(name.into(), Rc::new(driver));
    }

    /// Returns whether a driver is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.drivers.contains_key(name)
    }

    /// Opens a connection through the driver registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::DriverNotRegistered`] for an unknown `name`, or
    /// whatever the driver fails with.
    pub fn open(&self, name: &str, dsn: &str) -> Result<Box<dyn Connection>> {
        let driver = self
            .drivers
            .get(name)
            .ok_or_else(|| OrmError::DriverNotRegistered(name.to_string()))?;
        driver.open(dsn)
    }
}

impl fmt::Debug for Drivers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.drivers.keys().collect();
        names.sort();
        f.debug_struct("Drivers").field("names", &names).finish()
    }
}
