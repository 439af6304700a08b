//! CLI argument definitions.

use clap::Parser;
use std::path::PathBuf;

use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Datasource name, username and password, in that order
    #[arg(num_args = 0..=3)]
    pub credentials: Vec<String>,

    /// Initial statement, opened by the first control pulse
    #[arg(short, long)]
    pub query: Option<String>,

    /// Read events from this file instead of stdin
    #[arg(short, long)]
    pub script: Option<PathBuf>,

    /// Output format for the result channel
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Stop reading a result set after this many rows
    #[arg(long)]
    pub max_rows: Option<usize>,

    /// Log filter, e.g. `debug` or `sql_bridge=trace`
    #[arg(long)]
    pub log_level: Option<String>,
}
