//! Recorded sessions.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use oxide_orm::{Rows, Value};

/// A programmed answer to a query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Response {
    /// Column names.
    pub columns: Vec<String>,
    /// Rows.
    pub data: Vec<Vec<Value>>,
}

impl Response {
    /// Creates a response.
    #[must_use]
    pub fn new<I, S>(columns: I, data: Vec<Vec<Value>>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            data,
        }
    }
}

impl From<Response> for Rows {
    fn from(response: Response) -> Self {
        Self {
            columns: response.columns,
            data: response.data,
        }
    }
}

#[derive(Debug, Default)]
struct Log {
    statements: Vec<String>,
    queries: Vec<String>,
    responses: HashMap<String, Response>,
}

/// Handle to one session's log. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct Session {
    log: Rc<RefCell<Log>>,
}

impl Session {
    /// Executed statements, in order.
    #[must_use]
    pub fn statements(&self) -> Vec<String> {
        self.log.borrow().statements.clone()
    }

    /// Issued queries, in order.
    #[must_use]
    pub fn queries(&self) -> Vec<String> {
        self.log.borrow().queries.clone()
    }

    /// Executed statements as one script: each statement terminated by `;`
    /// and a newline.
    #[must_use]
    pub fn stmts(&self) -> String {
        let log = self.log.borrow();
        let mut script = String::new();
        for stmt in &log.statements {
            script.push_str(stmt);
            if !stmt.ends_with(';') {
                script.push(';');
            }
            script.push('\n');
        }
        script
    }

    pub(crate) fn record_statement(&self, sql: String) {
        self.log.borrow_mut().statements.push(sql);
    }

    pub(crate) fn record_query(&self, sql: String) {
        self.log.borrow_mut().queries.push(sql);
    }

    pub(crate) fn set_response(&self, query: impl Into<String>, response: Response) {
        self.log.borrow_mut().responses.insert(query.into(), response);
    }

    pub(crate) fn response(&self, query: &str) -> Option<Response> {
        self.log.borrow().responses.get(query).cloned()
    }
}
