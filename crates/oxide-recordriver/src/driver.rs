//! The recording driver.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use oxide_orm::{Connection, Driver, Result, Rows, Value};
use tracing::trace;

use crate::bind;
use crate::session::{Response, Session};

/// Driver whose connections record statements into keyed sessions.
///
/// The DSN a connection is opened with names its session. Clones share the
/// same sessions, so a clone can be registered with
/// [`Drivers`](oxide_orm::Drivers) while the original is kept to read the
/// logs back.
#[derive(Debug, Clone, Default)]
pub struct RecordDriver {
    sessions: Rc<RefCell<HashMap<String, Session>>>,
}

impl RecordDriver {
    /// Creates a driver without sessions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn session_or_create(&self, key: &str) -> Session {
        self.sessions
            .borrow_mut()
            .entry(key.to_string())
            .or_default()
            .clone()
    }

    /// Programs the answer to `query` in session `key`, creating the
    /// session if needed.
    pub fn set_response(&self, key: &str, query: impl Into<String>, response: Response) {
        self.session_or_create(key).set_response(query, response);
    }

    /// Returns session `key`, if any connection or response created it.
    #[must_use]
    pub fn session(&self, key: &str) -> Option<Session> {
        self.sessions.borrow().get(key).cloned()
    }
}

impl Driver for RecordDriver {
    fn open(&self, dsn: &str) -> Result<Box<dyn Connection>> {
        trace!(session = dsn, "opening recording connection");
        Ok(Box::new(RecordConn {
            session: self.session_or_create(dsn),
        }))
    }
}

struct RecordConn {
    session: Session,
}

impl Connection for RecordConn {
    fn exec(&mut self, sql: &str, args: &[Value]) -> Result<u64> {
        let stmt = bind::expand(sql, args)?;
        trace!(sql = %stmt, "recording statement");
        self.session.record_statement(stmt);
        Ok(0)
    }

    fn query(&mut self, sql: &str, args: &[Value]) -> Result<Rows> {
        let query = bind::expand(sql, args)?;
        let response = self
            .session
            .response(sql)
            .or_else(|| self.session.response(&query));
        trace!(sql = %query, programmed = response.is_some(), "recording query");
        self.session.record_query(query);
        Ok(response.map(Rows::from).unwrap_or_default())
    }
}
