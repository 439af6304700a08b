//! Shared test utilities: a scripted in-memory database client.
//!
//! Statements are registered by exact SQL text together with their input slot
//! types, result columns and the cells they yield. Everything the session does
//! to the client is recorded in a shared log for assertions.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use crate::db::{
    ClientError, ColumnDescriptor, Connection, Credentials, Cursor, DatabaseClient, DeclaredType,
    ScalarType, TypedScalar,
};

/// One value yielded by a scripted cursor.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Scalar(TypedScalar),
    /// A value of a type the bridge cannot marshal.
    Text(String),
}

pub fn int_cell(v: i32) -> Cell {
    Cell::Scalar(TypedScalar::Int32(v))
}

/// Something the session did to the client.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientCall {
    Connect(Credentials),
    Open(String),
    Bind {
        slot: usize,
        value: Option<TypedScalar>,
    },
    Execute,
    Close,
}

pub type ClientLog = Rc<RefCell<Vec<ClientCall>>>;

/// Shape and data of one scripted statement.
#[derive(Debug, Clone, Default)]
pub struct StatementScript {
    inputs: Vec<DeclaredType>,
    columns: Vec<ColumnDescriptor>,
    cells: Vec<Cell>,
    execute_error: Option<ClientError>,
    describe_error: Option<ClientError>,
}

impl StatementScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inputs(mut self, inputs: &[ScalarType]) -> Self {
        self.inputs = inputs.iter().map(|t| DeclaredType::Scalar(*t)).collect();
        self
    }

    pub fn declared_inputs(mut self, inputs: Vec<DeclaredType>) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn columns(mut self, columns: Vec<ColumnDescriptor>) -> Self {
        self.columns = columns;
        self
    }

    pub fn int_columns(self, names: &[&str]) -> Self {
        let columns = names
            .iter()
            .map(|n| ColumnDescriptor::new(*n, ScalarType::Int32.into()))
            .collect();
        self.columns(columns)
    }

    pub fn cells(mut self, cells: Vec<Cell>) -> Self {
        self.cells = cells;
        self
    }

    pub fn fail_execute(mut self, error: ClientError) -> Self {
        self.execute_error = Some(error);
        self
    }

    pub fn fail_describe(mut self, error: ClientError) -> Self {
        self.describe_error = Some(error);
        self
    }
}

/// In-memory `DatabaseClient` driven by registered statement scripts.
#[derive(Default)]
pub struct ScriptedClient {
    statements: Rc<HashMap<String, StatementScript>>,
    required: Option<Credentials>,
    log: ClientLog,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `script` under the exact statement text `sql`.
    pub fn with_statement(mut self, sql: &str, script: StatementScript) -> Self {
        Rc::make_mut(&mut self.statements).insert(sql.to_string(), script);
        self
    }

    /// Refuse every logon except with exactly these credentials.
    pub fn require_credentials(mut self, credentials: Credentials) -> Self {
        self.required = Some(credentials);
        self
    }

    pub fn log(&self) -> ClientLog {
        Rc::clone(&self.log)
    }
}

impl DatabaseClient for ScriptedClient {
    fn connect(&mut self, credentials: &Credentials) -> Result<Box<dyn Connection>, ClientError> {
        if let Some(required) = &self.required {
            if required != credentials {
                return Err(ClientError::new("password authentication failed")
                    .with_sqlstate("28P01"));
            }
        }
        self.log.borrow_mut().push(ClientCall::Connect(credentials.clone()));
        Ok(Box::new(ScriptedConnection {
            statements: Rc::clone(&self.statements),
            log: Rc::clone(&self.log),
        }))
    }

    fn client_name(&self) -> &'static str {
        "Scripted"
    }
}

struct ScriptedConnection {
    statements: Rc<HashMap<String, StatementScript>>,
    log: ClientLog,
}

impl Connection for ScriptedConnection {
    fn prepare_and_open(&mut self, sql: &str) -> Result<Box<dyn Cursor>, ClientError> {
        let script = self.statements.get(sql).cloned().ok_or_else(|| {
            ClientError::new("syntax error")
                .with_sqlstate("42601")
                .with_statement(sql)
        })?;
        self.log.borrow_mut().push(ClientCall::Open(sql.to_string()));
        Ok(Box::new(ScriptedCursor::from_script(script, Rc::clone(&self.log))))
    }
}

/// Cursor over a statement script.
pub struct ScriptedCursor {
    script: StatementScript,
    pending: VecDeque<Cell>,
    bound: Vec<Option<TypedScalar>>,
    log: ClientLog,
}

impl ScriptedCursor {
    fn from_script(script: StatementScript, log: ClientLog) -> Self {
        let bound = vec![None; script.inputs.len()];
        Self {
            script,
            pending: VecDeque::new(),
            bound,
            log,
        }
    }

    /// An already executed query cursor, for driving the collector directly.
    pub fn query(columns: Vec<ColumnDescriptor>, cells: Vec<Cell>) -> Self {
        let script = StatementScript::new().columns(columns).cells(cells);
        let pending = script.cells.iter().cloned().collect();
        Self {
            script,
            pending,
            bound: Vec::new(),
            log: ClientLog::default(),
        }
    }

    pub fn fail_describe(mut self, error: ClientError) -> Self {
        self.script.describe_error = Some(error);
        self
    }

    fn next_cell(&mut self) -> Result<Cell, ClientError> {
        self.pending
            .pop_front()
            .ok_or_else(|| ClientError::new("no more data"))
    }
}

impl Cursor for ScriptedCursor {
    fn input_slots(&self) -> &[DeclaredType] {
        &self.script.inputs
    }

    fn output_count(&self) -> usize {
        self.script.columns.len()
    }

    fn bind(&mut self, slot: usize, value: Option<TypedScalar>) -> Result<(), ClientError> {
        let target = self
            .bound
            .get_mut(slot)
            .ok_or_else(|| ClientError::new(format!("no input slot {}", slot)))?;
        *target = value;
        self.log.borrow_mut().push(ClientCall::Bind { slot, value });
        Ok(())
    }

    fn execute(&mut self) -> Result<(), ClientError> {
        self.log.borrow_mut().push(ClientCall::Execute);
        if let Some(error) = &self.script.execute_error {
            return Err(error.clone());
        }
        self.pending = self.script.cells.iter().cloned().collect();
        Ok(())
    }

    fn describe(&self) -> Result<Vec<ColumnDescriptor>, ClientError> {
        match &self.script.describe_error {
            Some(error) => Err(error.clone()),
            None => Ok(self.script.columns.clone()),
        }
    }

    fn eof(&self) -> bool {
        self.pending.is_empty()
    }

    fn read(&mut self, ty: ScalarType) -> Result<TypedScalar, ClientError> {
        match self.next_cell()? {
            Cell::Scalar(scalar) => Ok(scalar.cast(ty)),
            Cell::Text(text) => Err(ClientError::new(format!("cannot read '{}' as {}", text, ty))),
        }
    }

    fn skip(&mut self) -> Result<(), ClientError> {
        self.next_cell().map(|_| ())
    }

    fn close(&mut self) -> Result<(), ClientError> {
        self.log.borrow_mut().push(ClientCall::Close);
        self.pending.clear();
        Ok(())
    }
}
