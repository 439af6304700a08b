//! sql_bridge library - SQL query sessions driven by patch-style messages
//!
//! Provides the session state machine, typed value marshaling between message
//! atoms and database scalars, result collection, and output formatting for
//! querying a relational database from a message-passing host.

pub mod cli;
pub mod collector;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod output;
pub mod query;
pub mod script;
pub mod session;
pub mod types;

#[cfg(test)]
pub mod test_utils;
