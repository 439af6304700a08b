//! Query text assembly.
//!
//! Statements are taken verbatim or built from a message name and its
//! arguments, joined by single spaces. Integers print in decimal, floats in
//! fixed notation with six decimals, symbols as-is. Nothing is quoted or
//! escaped; the patch is responsible for sending safe SQL.

use crate::types::Atom;

/// Build statement text from a message name and its arguments.
///
/// ```
/// use sql_bridge::query::build_query;
/// use sql_bridge::types::Atom;
///
/// let sql = build_query("selectById", &[Atom::Int(42)]);
/// assert_eq!(sql, "selectById 42");
/// ```
pub fn build_query(selector: &str, args: &[Atom]) -> String {
    let mut query = String::from(selector);
    for arg in args {
        query.push(' ');
        query.push_str(&arg.to_string());
    }
    query
}

/// Take statement text as given, with surrounding whitespace removed.
pub fn verbatim(text: &str) -> String {
    text.trim().to_string()
}
