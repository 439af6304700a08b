use std::fs::File;
use std::io::{self, BufRead, BufReader};

use clap::Parser;
use tracing::{info, warn};

use sql_bridge::cli::Args;
use sql_bridge::config::{ConfigFile, Settings};
use sql_bridge::db::postgres::PostgresClient;
use sql_bridge::logging::init_logging;
use sql_bridge::output::WriterOutlet;
use sql_bridge::script::ScriptLine;
use sql_bridge::session::Session;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let settings = Settings::resolve(&args, ConfigFile::load()?);
    init_logging(&settings.log_level, settings.log_format)?;

    let outlet = WriterOutlet::new(io::stdout(), args.format);
    let mut session = Session::start(PostgresClient::new(), outlet, settings.credentials)
        .with_max_rows(settings.max_rows);
    if let Some(query) = &args.query {
        session.set_query(query);
    }

    let input: Box<dyn BufRead> = match &args.script {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(io::stdin().lock()),
    };

    for (number, line) in input.lines().enumerate() {
        let line = line?;
        match ScriptLine::parse(&line) {
            Ok(Some(ScriptLine::Event(event))) => session.dispatch(event),
            Ok(Some(ScriptLine::Attribute { name, value })) => {
                session.configure(&name, &value);
            }
            Ok(None) => {}
            Err(error) => warn!(line = number + 1, %error, "skipping input line"),
        }
    }

    session.shutdown();
    info!("input closed");
    Ok(())
}
