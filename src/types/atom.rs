//! The generic tagged value exchanged with the host patch.

use std::fmt;

use serde::Serialize;

/// A single loosely-typed value as carried by patch messages.
///
/// Serializes untagged, so a row becomes a plain JSON array such as `[1, 2.5, "x"]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Atom {
    Int(i64),
    Float(f64),
    Symbol(String),
}

impl Atom {
    pub fn symbol(s: impl Into<String>) -> Self {
        Atom::Symbol(s.into())
    }

    /// Parse one whitespace-free token the way a patch box would.
    ///
    /// Integers win over floats; anything that is not a number is a symbol.
    /// Words like `inf` or `nan` stay symbols even though `f64` would accept them.
    pub fn parse_token(token: &str) -> Self {
        if let Ok(i) = token.parse::<i64>() {
            return Atom::Int(i);
        }
        let numeric_start = token
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.'));
        if numeric_start {
            if let Ok(f) = token.parse::<f64>() {
                if f.is_finite() {
                    return Atom::Float(f);
                }
            }
        }
        Atom::Symbol(token.to_string())
    }

    /// Integer view, truncating floats. Symbols read as zero.
    pub fn as_i64(&self) -> i64 {
        match self {
            Atom::Int(i) => *i,
            Atom::Float(f) => *f as i64,
            Atom::Symbol(_) => 0,
        }
    }

    /// Float view, widening integers. Symbols read as zero.
    pub fn as_f64(&self) -> f64 {
        match self {
            Atom::Int(i) => *i as f64,
            Atom::Float(f) => *f,
            Atom::Symbol(_) => 0.0,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Atom::Int(_) => "int",
            Atom::Float(_) => "float",
            Atom::Symbol(_) => "symbol",
        }
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::Int(i) => write!(f, "{}", i),
            Atom::Float(v) => write!(f, "{:.6}", v),
            Atom::Symbol(s) => f.write_str(s),
        }
    }
}
