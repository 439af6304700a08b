//! The line protocol the CLI reads from a script file or stdin.
//!
//! Each line is one of:
//!
//! - `<channel> <tokens...>`: an event, e.g. `2 SELECT * FROM t` or `1 5 3.5`
//! - `attr <name> <value>`: a credential update, e.g. `attr password secret`
//! - blank, or starting with `#`: ignored

use crate::types::{Event, MessageError};

/// One meaningful line of input.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptLine {
    Event(Event),
    Attribute { name: String, value: String },
}

impl ScriptLine {
    /// Parse one line. `Ok(None)` for blank lines and comments.
    pub fn parse(line: &str) -> Result<Option<Self>, MessageError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        if let Some(rest) = line.strip_prefix("attr") {
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                let rest = rest.trim_start();
                let (name, value) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                return Ok(Some(ScriptLine::Attribute {
                    name: name.to_string(),
                    value: value.trim().to_string(),
                }));
            }
        }

        Event::parse(line).map(|event| Some(ScriptLine::Event(event)))
    }
}
