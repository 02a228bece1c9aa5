//! # oxide-recordriver
//!
//! A [`Driver`](oxide_orm::Driver) that executes nothing. Every statement is
//! appended, with its arguments bound as literals, to the log of the
//! [`Session`] named by the connection's DSN. Queries are logged separately
//! and answered from responses registered ahead of time, or with an empty
//! result set.
//!
//! ```ignore
//! use oxide_orm::{Drivers, Value};
//! use oxide_recordriver::{RecordDriver, Response};
//!
//! let recorder = RecordDriver::new();
//! recorder.set_response(
//!     "ddl",
//!     "SELECT VERSION()",
//!     Response::new(["VERSION()"], vec![vec![Value::from("8.0.24")]]),
//! );
//!
//! let mut drivers = Drivers::new();
//! drivers.register("recordriver", recorder.clone());
//! // ... run migrations through a dialect whose DSN is "ddl" ...
//!
//! let sql = recorder.session("ddl").unwrap().stmts();
//! ```

pub mod bind;
mod driver;
mod session;

pub use driver::RecordDriver;
pub use session::{Response, Session};
