//! PostgreSQL client implementation.
//!
//! This module provides the database client used outside of tests, built on the
//! synchronous `postgres` crate:
//! - Prepared statements report their parameter and column types, which map
//!   directly onto input and output slots
//! - Statements are executed once every input slot is bound
//! - Result rows are buffered on the cursor and read cell by cell

mod conversion;
mod walk;

use std::cell::RefCell;
use std::rc::Rc;

use postgres::{Client, Config, NoTls, Row, Statement};
use tracing::debug;

use super::ClientError;
use super::backend::{ColumnDescriptor, Connection, Cursor, DatabaseClient};
use super::connection::Credentials;
use super::value::{DeclaredType, ScalarType, TypedScalar};

pub use conversion::{UntypedNull, client_error, declared_type, read_cell, to_sql_param};
pub use walk::{CellWalk, ParamSlots};

/// Build a connection config from bridge credentials.
///
/// The datasource name is either a libpq-style connection string
/// (`host=localhost dbname=testdb`), a `postgres://` URL, or a bare database
/// name on localhost. Non-empty username and password override whatever the
/// datasource name carries.
pub fn connection_config(credentials: &Credentials) -> Result<Config, ClientError> {
    let dsn = credentials.datasource_name.trim();
    let is_connection_string =
        dsn.contains('=') || dsn.starts_with("postgres://") || dsn.starts_with("postgresql://");

    let mut config = if is_connection_string {
        dsn.parse::<Config>()
            .map_err(|e| ClientError::new(format!("invalid datasource '{}': {}", dsn, e)))?
    } else {
        let mut config = Config::new();
        config.host("localhost");
        if !dsn.is_empty() {
            config.dbname(dsn);
        }
        config
    };

    if !credentials.username.is_empty() {
        config.user(credentials.username.as_str());
    }
    if !credentials.password.is_empty() {
        config.password(credentials.password.as_str());
    }
    Ok(config)
}

/// Client that logs on to PostgreSQL without TLS.
#[derive(Debug, Default)]
pub struct PostgresClient;

impl PostgresClient {
    pub fn new() -> Self {
        Self
    }
}

impl DatabaseClient for PostgresClient {
    fn connect(&mut self, credentials: &Credentials) -> Result<Box<dyn Connection>, ClientError> {
        let config = connection_config(credentials)?;
        let client = config.connect(NoTls).map_err(|e| client_error(&e))?;
        Ok(Box::new(PostgresConnection {
            client: Rc::new(RefCell::new(client)),
        }))
    }

    fn client_name(&self) -> &'static str {
        "Postgres"
    }
}

/// A live PostgreSQL session.
///
/// The client is shared with the cursor it opens; the session never has more
/// than one cursor, so borrows never overlap.
pub struct PostgresConnection {
    client: Rc<RefCell<Client>>,
}

impl Connection for PostgresConnection {
    fn prepare_and_open(&mut self, sql: &str) -> Result<Box<dyn Cursor>, ClientError> {
        let statement = self
            .client
            .borrow_mut()
            .prepare(sql)
            .map_err(|e| client_error(&e).with_statement(sql))?;
        Ok(Box::new(PostgresCursor::new(
            Rc::clone(&self.client),
            statement,
            sql,
        )))
    }
}

/// A prepared statement plus the rows of its last execution.
pub struct PostgresCursor {
    client: Rc<RefCell<Client>>,
    statement: Statement,
    sql: String,
    inputs: Vec<DeclaredType>,
    params: ParamSlots,
    rows: Vec<Row>,
    walk: CellWalk,
}

impl PostgresCursor {
    fn new(client: Rc<RefCell<Client>>, statement: Statement, sql: &str) -> Self {
        let inputs: Vec<DeclaredType> = statement.params().iter().map(declared_type).collect();
        let params = ParamSlots::new(inputs.len());
        let walk = CellWalk::new(statement.columns().len());
        Self {
            client,
            statement,
            sql: sql.to_string(),
            inputs,
            params,
            rows: Vec::new(),
            walk,
        }
    }

    fn position(&self) -> Result<(usize, usize), ClientError> {
        self.walk.position().map_err(|e| e.with_statement(&self.sql))
    }
}

impl Cursor for PostgresCursor {
    fn input_slots(&self) -> &[DeclaredType] {
        &self.inputs
    }

    fn output_count(&self) -> usize {
        self.statement.columns().len()
    }

    fn bind(&mut self, slot: usize, value: Option<TypedScalar>) -> Result<(), ClientError> {
        self.params
            .set(slot, value)
            .map_err(|e| e.with_statement(&self.sql))
    }

    fn execute(&mut self) -> Result<(), ClientError> {
        let params: Vec<_> = self
            .inputs
            .iter()
            .zip(self.params.values())
            .map(|(declared, value)| to_sql_param(declared, *value))
            .collect();
        let refs: Vec<&(dyn postgres::types::ToSql + Sync)> =
            params.iter().map(|p| p.as_ref()).collect();

        let mut client = self.client.borrow_mut();
        if self.statement.columns().is_empty() {
            let affected = client
                .execute(&self.statement, &refs)
                .map_err(|e| client_error(&e).with_statement(&self.sql))?;
            debug!(affected, sql = %self.sql, "statement executed");
            self.rows.clear();
        } else {
            self.rows = client
                .query(&self.statement, &refs)
                .map_err(|e| client_error(&e).with_statement(&self.sql))?;
            debug!(rows = self.rows.len(), sql = %self.sql, "query executed");
        }
        self.walk.reset(self.rows.len());
        Ok(())
    }

    fn describe(&self) -> Result<Vec<ColumnDescriptor>, ClientError> {
        Ok(self
            .statement
            .columns()
            .iter()
            .map(|c| ColumnDescriptor::new(c.name(), declared_type(c.type_())))
            .collect())
    }

    fn eof(&self) -> bool {
        self.walk.eof()
    }

    fn read(&mut self, ty: ScalarType) -> Result<TypedScalar, ClientError> {
        let (row, column) = self.position()?;
        let scalar = read_cell(&self.rows[row], column, ty).map_err(|e| {
            client_error(&e)
                .with_statement(&self.sql)
                .with_variable(self.statement.columns()[column].name())
        })?;
        self.walk.advance();
        Ok(scalar)
    }

    fn skip(&mut self) -> Result<(), ClientError> {
        self.position()?;
        self.walk.advance();
        Ok(())
    }

    fn close(&mut self) -> Result<(), ClientError> {
        self.rows.clear();
        self.walk.reset(0);
        Ok(())
    }
}
