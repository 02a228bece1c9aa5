//! Supported engines and their dialect adapters.

use std::fmt;
use std::str::FromStr;

use oxide_orm::{
    Dialector, Mysql, MysqlConfig, Postgres, PostgresConfig, SqlServer, SqlServerConfig, Sqlite,
    SqliteConfig,
};

use crate::error::LoadError;

/// Name the recording driver is registered under.
pub const DRIVER_NAME: &str = "recordriver";

/// Session key (DSN) every load records into.
pub const SESSION_KEY: &str = "ddl";

/// A canned answer to the version query a dialect issues on connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeededVersion {
    /// Query text, matched exactly.
    pub query: &'static str,
    /// Column name of the single result column.
    pub column: &'static str,
    /// Reported version.
    pub version: &'static str,
}

/// A target database engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Engine {
    /// MySQL.
    Mysql,
    /// PostgreSQL.
    Postgres,
    /// SQLite.
    Sqlite,
    /// Microsoft SQL Server.
    SqlServer,
}

impl Engine {
    /// Every supported engine.
    pub const ALL: [Self; 4] = [Self::Mysql, Self::Postgres, Self::Sqlite, Self::SqlServer];

    /// Engine name as accepted on the command line.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Mysql => "mysql",
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
            Self::SqlServer => "sqlserver",
        }
    }

    /// Builds the dialect, wired to the recording driver.
    #[must_use]
    pub fn dialector(self) -> Box<dyn Dialector> {
        let driver_name = DRIVER_NAME.to_string();
        let dsn = SESSION_KEY.to_string();
        match self {
            Self::Mysql => Box::new(Mysql::new(MysqlConfig { driver_name, dsn })),
            Self::Postgres => Box::new(Postgres::new(PostgresConfig { driver_name, dsn })),
            Self::Sqlite => Box::new(Sqlite::new(SqliteConfig { driver_name, dsn })),
            Self::SqlServer => Box::new(SqlServer::new(SqlServerConfig { driver_name, dsn })),
        }
    }

    /// The version answer the dialect needs on connect, if it asks.
    #[must_use]
    pub const fn seeded_version(self) -> Option<SeededVersion> {
        match self {
            Self::Mysql => Some(SeededVersion {
                query: Mysql::VERSION_QUERY,
                column: "VERSION()",
                version: "8.0.24",
            }),
            Self::Sqlite => Some(SeededVersion {
                query: Sqlite::VERSION_QUERY,
                column: "sqlite_version()",
                version: "3.30.1",
            }),
            Self::Postgres | Self::SqlServer => None,
        }
    }

    /// Whether foreign keys are written inline at table creation instead of
    /// by a separate constraint pass.
    #[must_use]
    pub const fn inline_foreign_keys(self) -> bool {
        matches!(self, Self::Sqlite)
    }
}

impl FromStr for Engine {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|engine| engine.name() == s)
            .ok_or_else(|| LoadError::UnsupportedEngine(s.to_string()))
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_engine() {
        for engine in Engine::ALL {
            assert_eq!(engine.name().parse::<Engine>().unwrap(), engine);
        }
        let err = "oracle".parse::<Engine>().unwrap_err();
        assert_eq!(err.to_string(), "unsupported engine: oracle");
    }

    #[test]
    fn test_dialector_uses_recording_driver() {
        for engine in Engine::ALL {
            let dialect = engine.dialector();
            assert_eq!(dialect.name(), engine.name());
            assert_eq!(dialect.driver_name(), DRIVER_NAME);
            assert_eq!(dialect.dsn(), SESSION_KEY);
        }
    }

    #[test]
    fn test_seeded_versions() {
        assert_eq!(Engine::Mysql.seeded_version().unwrap().query, "SELECT VERSION()");
        assert_eq!(Engine::Sqlite.seeded_version().unwrap().version, "3.30.1");
        assert!(Engine::Postgres.seeded_version().is_none());
        assert!(Engine::SqlServer.seeded_version().is_none());
    }
}
