//! Database access for the bridge.
//!
//! This module provides the database abstraction layer:
//! - Client, connection and cursor traits (`backend`)
//! - Credentials and logon (`connection`)
//! - Conversion between patch atoms and typed scalars (`value`)
//! - The PostgreSQL client (`postgres`)
//!
//! # Type Decisions
//!
//! **Why a closed `ScalarType` set?**
//! Patch atoms only know integers, floats and symbols, so only int32, int64,
//! float32 and float64 round-trip without inventing a text encoding. Every
//! other column or parameter type is carried as `DeclaredType::Unsupported`
//! with its client-side name and skipped when marshaled.
//!
//! **Why does the cursor take slot indices instead of binding positionally?**
//! The session owns the bound-parameter position. Cursors stay dumb stores,
//! which keeps the scripted test client trivial.

mod backend;
mod connection;
pub mod postgres;
mod value;

use std::fmt;

pub use backend::{ColumnDescriptor, Connection, Cursor, DatabaseClient};
pub use connection::{Credentials, open_connection};
pub use value::{
    DeclaredType, ScalarType, TypedScalar, bind_atom, from_scalar, read_atom, to_scalar,
};

/// A failure raised by the database client.
///
/// Carries the diagnostic detail a client library reports: the message, the
/// statement text that caused it, the vendor status code and the variable
/// involved, when known.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientError {
    pub message: String,
    pub statement: Option<String>,
    pub sqlstate: Option<String>,
    pub variable: Option<String>,
}

impl ClientError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_statement(mut self, statement: impl Into<String>) -> Self {
        self.statement = Some(statement.into());
        self
    }

    pub fn with_sqlstate(mut self, sqlstate: impl Into<String>) -> Self {
        self.sqlstate = Some(sqlstate.into());
        self
    }

    pub fn with_variable(mut self, variable: impl Into<String>) -> Self {
        self.variable = Some(variable.into());
        self
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if let Some(state) = &self.sqlstate {
            write!(f, " [SQLSTATE {}]", state)?;
        }
        if let Some(statement) = &self.statement {
            write!(f, " in '{}'", statement)?;
        }
        if let Some(variable) = &self.variable {
            write!(f, " (variable {})", variable)?;
        }
        Ok(())
    }
}

impl std::error::Error for ClientError {}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_client_error_message_only() {
        assert_eq!(ClientError::new("boom").to_string(), "boom");
    }

    #[rstest]
    fn test_client_error_full_detail() {
        let err = ClientError::new("password authentication failed")
            .with_sqlstate("28P01")
            .with_statement("SELECT 1")
            .with_variable(":1");
        assert_eq!(
            err.to_string(),
            "password authentication failed [SQLSTATE 28P01] in 'SELECT 1' (variable :1)"
        );
    }
}
