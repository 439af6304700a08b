//! Database client traits.
//!
//! The session only ever talks to a database through these three traits, so the
//! PostgreSQL client and the scripted test client are interchangeable.

use super::ClientError;
use super::connection::Credentials;
use super::value::{DeclaredType, ScalarType, TypedScalar};

/// Name and declared type of one output slot.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub declared: DeclaredType,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, declared: DeclaredType) -> Self {
        Self {
            name: name.into(),
            declared,
        }
    }
}

/// Factory for connections. One per session.
pub trait DatabaseClient {
    /// Log on with the given credentials.
    fn connect(&mut self, credentials: &Credentials) -> Result<Box<dyn Connection>, ClientError>;

    /// Get the client name for logging/debugging.
    fn client_name(&self) -> &'static str;
}

/// A live database connection.
pub trait Connection {
    /// Prepare `sql` and open a cursor on it.
    ///
    /// The returned cursor knows its input slot types and its output slot count.
    /// A statement with no input slots is not executed until [`Cursor::execute`].
    fn prepare_and_open(&mut self, sql: &str) -> Result<Box<dyn Cursor>, ClientError>;
}

/// An open prepared statement together with its result rows.
pub trait Cursor {
    /// Declared types of the placeholders, in order.
    fn input_slots(&self) -> &[DeclaredType];

    /// Number of result columns.
    fn output_count(&self) -> usize;

    /// Bind `value` into input slot `slot`. `None` binds NULL.
    fn bind(&mut self, slot: usize, value: Option<TypedScalar>) -> Result<(), ClientError>;

    /// Run the statement with the values bound so far.
    fn execute(&mut self) -> Result<(), ClientError>;

    /// Describe the result columns of the executed statement.
    fn describe(&self) -> Result<Vec<ColumnDescriptor>, ClientError>;

    /// True when no unread scalar is left.
    fn eof(&self) -> bool;

    /// Read the next scalar as `ty`.
    fn read(&mut self, ty: ScalarType) -> Result<TypedScalar, ClientError>;

    /// Discard the next scalar without converting it.
    fn skip(&mut self) -> Result<(), ClientError>;

    /// Release the statement. Unread rows are discarded.
    fn close(&mut self) -> Result<(), ClientError>;
}
