//! Errors reported by the bridge.
//!
//! None of these stop the bridge. Each one is reported through the outlet and
//! the session carries on from the nearest well-defined state.

use thiserror::Error;

use crate::db::ClientError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BridgeError {
    #[error("connection to '{datasource}' failed: {source}")]
    Connection {
        datasource: String,
        #[source]
        source: ClientError,
    },

    #[error("no statement specified")]
    EmptyStatement,

    #[error("statement failed: {0}")]
    Statement(#[source] ClientError),

    #[error("cannot describe result columns: {0}")]
    Describe(#[source] ClientError),

    #[error("reading result failed: {0}")]
    Fetch(#[source] ClientError),

    #[error("unsupported type '{type_name}'")]
    UnsupportedType { type_name: String },

    #[error("statement not initialized, value {value} dropped")]
    BindBeforeReady { value: String },

    #[error("statement '{statement}' takes no parameters, value {value} dropped")]
    ParameterOverflow { statement: String, value: String },

    #[error("row limit of {limit} reached, remaining rows left unread")]
    RowLimitReached { limit: usize },
}
