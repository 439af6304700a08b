//! The result channel.
//!
//! An [`Outlet`] receives everything the bridge sends: column names, rows, and
//! completion pulses, plus diagnostics for errors. Supports multiple output
//! formats for the CLI: text (patch-style), JSON, and toon.

use std::io::Write;

use clap::ValueEnum;
use serde::Serialize;
use tracing::warn;

use crate::collector::ResultSet;
use crate::error::BridgeError;
use crate::types::{Atom, Outbound};

/// Destination of outbound messages and error reports.
pub trait Outlet {
    /// Send one message on the result channel.
    fn send(&mut self, message: Outbound);

    /// Report a non-fatal error. The default logs it.
    fn report(&mut self, error: &BridgeError) {
        warn!(%error, "sql_bridge");
    }
}

/// Emit a result set: the column names, each row, then a bare pulse.
pub fn emit(outlet: &mut dyn Outlet, result: ResultSet) {
    let headers = result.headers.into_iter().map(Atom::Symbol).collect();
    outlet.send(Outbound::List(headers));
    for row in result.rows {
        outlet.send(Outbound::List(row));
    }
    outlet.send(Outbound::Bang);
}

/// Outlet that keeps everything in memory.
#[derive(Debug, Default)]
pub struct MemoryOutlet {
    pub messages: Vec<Outbound>,
    pub errors: Vec<BridgeError>,
}

impl MemoryOutlet {
    /// Drain and return what was sent so far.
    pub fn take_messages(&mut self) -> Vec<Outbound> {
        std::mem::take(&mut self.messages)
    }
}

impl Outlet for MemoryOutlet {
    fn send(&mut self, message: Outbound) {
        self.messages.push(message);
    }

    fn report(&mut self, error: &BridgeError) {
        warn!(%error, "sql_bridge");
        self.errors.push(error.clone());
    }
}

/// Output format for outbound messages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Space-separated atoms, `bang` for pulses
    #[default]
    Text,
    /// One JSON value per line
    Json,
    /// Token-efficient toon format
    Toon,
}

/// Trait for types that can be formatted for output
pub trait Outputable: Serialize {
    /// Format as patch-style text
    fn to_text(&self) -> String;

    /// Format according to the specified output format
    fn format(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Text => self.to_text(),
            OutputFormat::Json => serde_json::to_string(self).unwrap_or_default(),
            OutputFormat::Toon => {
                let json_value = serde_json::to_value(self).unwrap_or_default();
                toon::encode(&json_value, None)
            }
        }
    }
}

impl Outputable for Outbound {
    fn to_text(&self) -> String {
        self.to_string()
    }
}

/// Outlet writing one formatted line per message to a writer (stdout in the CLI).
pub struct WriterOutlet<W: Write> {
    writer: W,
    format: OutputFormat,
}

impl<W: Write> WriterOutlet<W> {
    pub fn new(writer: W, format: OutputFormat) -> Self {
        Self { writer, format }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Outlet for WriterOutlet<W> {
    fn send(&mut self, message: Outbound) {
        let line = message.format(self.format);
        if let Err(error) = writeln!(self.writer, "{}", line).and_then(|_| self.writer.flush()) {
            warn!(%error, "failed to write result");
        }
    }
}
