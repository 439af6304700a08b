//! The query session state machine.
//!
//! A [`Session`] owns the one connection and the one open statement. It
//! turns three independently arriving input streams into prepared-statement
//! executions:
//!
//! - control pulses flush the open statement, or open a pending one
//! - parameter values are bound into the statement's input slots in order
//! - query text (re)opens the statement
//!
//! States, as reported by [`Session::state`]:
//!
//! ```text
//! Disconnected --connect--> Idle --open--> AwaitingParameters --last bind--> (execute)
//!                            ^                                                   |
//!                            |                      outputs? --yes--> Fetching --+
//!                            +------------- no, or fetched / flushed <-----------+
//! ```
//!
//! `Fetching` only exists inside a single call; reading a result set runs to
//! completion before the call returns. A statement with no input slots is
//! executed as soon as it opens.
//!
//! Nothing here is fatal. Operations return `BridgeError` for the caller to
//! report, and [`Session::dispatch`] reports them through the outlet itself.

use tracing::{debug, info, warn};

use crate::collector::collect;
use crate::db::{
    Connection, Credentials, Cursor, DatabaseClient, bind_atom, open_connection,
};
use crate::error::BridgeError;
use crate::output::{Outlet, emit};
use crate::query::{build_query, verbatim};
use crate::types::{Atom, Channel, Event, Message, Outbound};


/// Externally visible lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No connection. The next open or credential change retries.
    Disconnected,
    /// Connected, no statement waiting for input or holding unread rows.
    Idle,
    /// A statement is open and still has unbound input slots.
    AwaitingParameters,
    /// A statement was executed and has rows left to read.
    ReadyToFetch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    AwaitingParameters,
    ReadyToFetch,
    Done,
}

struct OpenStatement {
    sql: String,
    cursor: Box<dyn Cursor>,
    next_slot: usize,
    phase: Phase,
}

/// One bridge instance: credentials, connection, statement and result outlet.
pub struct Session<C: DatabaseClient, O: Outlet> {
    client: C,
    outlet: O,
    credentials: Credentials,
    connection: Option<Box<dyn Connection>>,
    statement: Option<OpenStatement>,
    query: String,
    query_pending: bool,
    max_rows: Option<usize>,
}

impl<C: DatabaseClient, O: Outlet> Session<C, O> {
    /// Create a disconnected session.
    pub fn new(client: C, outlet: O, credentials: Credentials) -> Self {
        Self {
            client,
            outlet,
            credentials,
            connection: None,
            statement: None,
            query: String::new(),
            query_pending: false,
            max_rows: None,
        }
    }

    /// Create a session and attempt the initial connection.
    ///
    /// A failed connection is reported, and the session stays usable.
    pub fn start(client: C, outlet: O, credentials: Credentials) -> Self {
        let mut session = Self::new(client, outlet, credentials);
        if let Err(error) = session.connect() {
            session.outlet.report(&error);
        }
        session
    }

    /// Stop reading a result set after `max_rows` rows. `None` or zero reads everything.
    pub fn with_max_rows(mut self, max_rows: Option<usize>) -> Self {
        self.max_rows = max_rows.filter(|limit| *limit > 0);
        self
    }

    pub fn state(&self) -> SessionState {
        match (&self.connection, &self.statement) {
            (None, _) => SessionState::Disconnected,
            (Some(_), None) => SessionState::Idle,
            (Some(_), Some(statement)) => match statement.phase {
                Phase::AwaitingParameters => SessionState::AwaitingParameters,
                Phase::ReadyToFetch => SessionState::ReadyToFetch,
                Phase::Done => SessionState::Idle,
            },
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// The last known query text.
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn has_open_cursor(&self) -> bool {
        self.statement.is_some()
    }

    /// Number of input slots bound so far on the open statement.
    pub fn bound_slots(&self) -> Option<usize> {
        self.statement.as_ref().map(|s| s.next_slot)
    }

    pub fn outlet(&self) -> &O {
        &self.outlet
    }

    pub fn outlet_mut(&mut self) -> &mut O {
        &mut self.outlet
    }

    /// (Re)connect with the current credentials.
    ///
    /// Any open statement is closed first and its unread rows are discarded.
    pub fn connect(&mut self) -> Result<(), BridgeError> {
        self.close_statement();
        self.connection = None;
        let connection = open_connection(&mut self.client, &self.credentials)?;
        info!(
            datasource = %self.credentials.datasource_name,
            client = self.client.client_name(),
            "database connection established"
        );
        self.connection = Some(connection);
        Ok(())
    }

    /// Replace all credentials and reconnect.
    pub fn set_credentials(&mut self, credentials: Credentials) -> Result<(), BridgeError> {
        self.credentials = credentials;
        self.connect()
    }

    /// Update one credential by name and reconnect using all current values.
    ///
    /// Errors are reported through the outlet. Returns false for an unknown name.
    pub fn configure(&mut self, name: &str, value: &str) -> bool {
        if !self.credentials.set(name, value) {
            warn!(attribute = name, "unknown attribute");
            return false;
        }
        if let Err(error) = self.connect() {
            self.outlet.report(&error);
        }
        true
    }

    /// Hold `text` as the pending statement without opening it.
    ///
    /// The next control pulse with no open cursor opens it.
    pub fn set_query(&mut self, text: &str) {
        self.query = verbatim(text);
        self.query_pending = !self.query.is_empty();
    }

    /// Open a statement, closing the current one first.
    ///
    /// With `query`, that text becomes the current query; otherwise the last
    /// known text is reopened. A statement without input slots is executed
    /// right away, and its rows are emitted if it has output slots.
    pub fn open_statement(&mut self, query: Option<String>) -> Result<(), BridgeError> {
        if let Some(text) = query {
            self.set_query(&text);
        }
        if self.query.is_empty() {
            return Err(BridgeError::EmptyStatement);
        }
        self.close_statement();

        let sql = self.query.clone();
        let mut connection = match self.connection.take() {
            Some(connection) => connection,
            None => {
                let connection = open_connection(&mut self.client, &self.credentials)?;
                info!(datasource = %self.credentials.datasource_name, "reconnected");
                connection
            }
        };
        let opened = connection.prepare_and_open(&sql);
        self.connection = Some(connection);
        let cursor = opened.map_err(BridgeError::Statement)?;

        let inputs = cursor.input_slots().len();
        debug!(%sql, inputs, outputs = cursor.output_count(), "statement opened");
        self.query_pending = false;
        self.statement = Some(OpenStatement {
            sql,
            cursor,
            next_slot: 0,
            phase: Phase::AwaitingParameters,
        });

        if inputs == 0 {
            self.execute_and_fetch()?;
        }
        Ok(())
    }

    /// Bind one value into the next input slot of the open statement.
    ///
    /// Once every slot is bound the statement executes; if it has output
    /// slots its result set is read and emitted immediately. A value arriving
    /// after all slots were consumed reopens the same statement and starts a
    /// new binding cycle with it.
    pub fn bind_value(&mut self, atom: Atom) -> Result<(), BridgeError> {
        let Some(statement) = self.statement.as_mut() else {
            return Err(BridgeError::BindBeforeReady {
                value: atom.to_string(),
            });
        };

        if statement.phase != Phase::AwaitingParameters {
            if statement.cursor.input_slots().is_empty() {
                return Err(BridgeError::ParameterOverflow {
                    statement: statement.sql.clone(),
                    value: atom.to_string(),
                });
            }
            let sql = statement.sql.clone();
            debug!(%sql, "input slots exhausted, reopening statement");
            self.open_statement(Some(sql))?;
            return self.bind_value(atom);
        }

        let slot = statement.next_slot;
        let declared = statement.cursor.input_slots()[slot].clone();
        match bind_atom(statement.cursor.as_mut(), slot, &atom, &declared) {
            Ok(()) => {}
            Err(error @ BridgeError::UnsupportedType { .. }) => self.outlet.report(&error),
            Err(error) => return Err(error),
        }
        statement.next_slot += 1;
        debug!(slot, value = %atom, "bound");

        if statement.next_slot == statement.cursor.input_slots().len() {
            self.execute_and_fetch()?;
        }
        Ok(())
    }

    /// Drain unread rows, close the cursor and send a completion pulse.
    ///
    /// With a row limit the remaining rows are emitted in several result sets.
    /// Without an open cursor this does nothing.
    pub fn flush(&mut self) -> Result<(), BridgeError> {
        if self.statement.is_none() {
            return Ok(());
        }
        let mut drained = Ok(());
        while self
            .statement
            .as_ref()
            .is_some_and(|s| s.phase == Phase::ReadyToFetch)
        {
            if let Err(error) = self.fetch() {
                drained = Err(error);
                break;
            }
        }
        self.close_statement();
        self.outlet.send(Outbound::Bang);
        drained
    }

    /// Reopen with `query`, or with the last known text if no cursor is open.
    pub fn trigger(&mut self, query: Option<String>) -> Result<(), BridgeError> {
        match query {
            Some(text) => self.open_statement(Some(text)),
            None if self.statement.is_none() => self.open_statement(None),
            None => Ok(()),
        }
    }

    /// Close the statement and drop the connection.
    pub fn shutdown(&mut self) {
        self.close_statement();
        if self.connection.take().is_some() {
            info!("database connection closed");
        }
    }

    /// Handle one inbound event. Errors are reported through the outlet.
    pub fn dispatch(&mut self, event: Event) {
        let Event { channel, message } = event;
        let result = match (channel, message) {
            (Channel::Control, Message::Bang) => self.control_pulse(),
            (Channel::Control, Message::Anything { selector, args }) => {
                self.trigger(Some(build_query(&selector, &args)))
            }
            (Channel::Parameters, Message::Bang) => Ok(()),
            (Channel::Parameters, message) => {
                self.bind_all(message.into_scalars());
                Ok(())
            }
            (Channel::Query, Message::Bang) => self.open_statement(None),
            (Channel::Query, Message::Anything { selector, args }) => {
                self.open_statement(Some(build_query(&selector, &args)))
            }
            (channel, message) => {
                debug!(channel = channel.index(), ?message, "message ignored");
                Ok(())
            }
        };
        if let Err(error) = result {
            self.outlet.report(&error);
        }
    }

    fn control_pulse(&mut self) -> Result<(), BridgeError> {
        if self.statement.is_some() {
            self.flush()
        } else if self.query_pending {
            self.open_statement(None)
        } else {
            Ok(())
        }
    }

    fn bind_all(&mut self, atoms: Vec<Atom>) {
        for atom in atoms {
            if let Err(error) = self.bind_value(atom) {
                self.outlet.report(&error);
            }
        }
    }

    fn execute_and_fetch(&mut self) -> Result<(), BridgeError> {
        let Some(statement) = self.statement.as_mut() else {
            return Ok(());
        };
        if let Err(error) = statement.cursor.execute() {
            statement.phase = Phase::Done;
            return Err(BridgeError::Statement(error));
        }
        if statement.cursor.output_count() == 0 {
            debug!(sql = %statement.sql, "executed, no result columns");
            statement.phase = Phase::Done;
            return Ok(());
        }
        statement.phase = Phase::ReadyToFetch;
        self.fetch()
    }

    fn fetch(&mut self) -> Result<(), BridgeError> {
        let Some(statement) = self.statement.as_mut() else {
            return Ok(());
        };
        let collected = collect(statement.cursor.as_mut(), &mut self.outlet, self.max_rows);
        statement.phase = if statement.cursor.eof() {
            Phase::Done
        } else {
            Phase::ReadyToFetch
        };
        match collected {
            Ok(result) => {
                debug!(rows = result.rows.len(), "result set collected");
                emit(&mut self.outlet, result);
                Ok(())
            }
            Err(error) => {
                statement.phase = Phase::Done;
                Err(error)
            }
        }
    }

    fn close_statement(&mut self) {
        if let Some(mut statement) = self.statement.take() {
            if let Err(error) = statement.cursor.close() {
                self.outlet.report(&BridgeError::Statement(error));
            }
            debug!(sql = %statement.sql, "statement closed");
        }
    }
}
