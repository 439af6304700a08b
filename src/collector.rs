//! Result collection: read an executed cursor into a fully buffered result set.

use serde::Serialize;
use tracing::debug;

use crate::db::{Cursor, read_atom};
use crate::error::BridgeError;
use crate::output::Outlet;
use crate::types::Atom;

/// Column names and complete rows of one execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultSet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Atom>>,
}

/// Read everything the cursor has left.
///
/// Output slots are visited cyclically and every visit consumes one scalar.
/// Each supported slot contributes one atom to the row buffer; each unsupported
/// slot is reported and contributes nothing, so its row comes out short. A row
/// is appended each time the last output slot has been visited. A row the
/// cursor runs dry in the middle of is dropped.
///
/// With `max_rows`, reading stops after that many rows; the rest stays unread
/// on the cursor and `RowLimitReached` is reported.
///
/// # Errors
///
/// `Describe` if the columns cannot be enumerated, `Fetch` if a read fails.
/// Either way nothing is handed on for emission.
pub fn collect(
    cursor: &mut dyn Cursor,
    outlet: &mut dyn Outlet,
    max_rows: Option<usize>,
) -> Result<ResultSet, BridgeError> {
    let columns = cursor.describe().map_err(BridgeError::Describe)?;
    let mut result = ResultSet {
        headers: columns.iter().map(|c| c.name.clone()).collect(),
        rows: Vec::new(),
    };
    if columns.is_empty() {
        return Ok(result);
    }

    let width = columns.len();
    let mut buffer: Vec<Atom> = Vec::with_capacity(width);
    let mut slot = 0;

    while !cursor.eof() {
        if let Some(limit) = max_rows {
            if result.rows.len() >= limit {
                outlet.report(&BridgeError::RowLimitReached { limit });
                break;
            }
        }

        match read_atom(cursor, &columns[slot].declared) {
            Ok(atom) => buffer.push(atom),
            Err(err @ BridgeError::UnsupportedType { .. }) => outlet.report(&err),
            Err(err) => return Err(err),
        }
        slot += 1;

        if slot == width {
            slot = 0;
            result.rows.push(std::mem::replace(&mut buffer, Vec::with_capacity(width)));
        }
    }

    if slot != 0 {
        debug!(read = slot, width, "discarding incomplete trailing row");
    }
    Ok(result)
}
