//! Inbound events and outbound messages.
//!
//! Every inbound event carries the channel it arrived on explicitly; the session
//! dispatches on it with a single `match`.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use super::Atom;

/// Logical input channel of an inbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Control pulses: flush or (re)open.
    Control,
    /// Parameter values bound into the open statement.
    Parameters,
    /// Query text.
    Query,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MessageError {
    #[error("unknown channel '{0}' (expected 0, 1 or 2)")]
    UnknownChannel(String),

    #[error("missing channel number")]
    MissingChannel,
}

impl TryFrom<u8> for Channel {
    type Error = MessageError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Channel::Control),
            1 => Ok(Channel::Parameters),
            2 => Ok(Channel::Query),
            other => Err(MessageError::UnknownChannel(other.to_string())),
        }
    }
}

impl Channel {
    pub fn index(self) -> u8 {
        match self {
            Channel::Control => 0,
            Channel::Parameters => 1,
            Channel::Query => 2,
        }
    }
}

/// A patch message: a bare pulse, a number, a list, or a named message with arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Bang,
    Int(i64),
    Float(f64),
    List(Vec<Atom>),
    Anything { selector: String, args: Vec<Atom> },
}

impl Message {
    /// Classify a sequence of atoms the way a patch cord delivers them.
    ///
    /// - nothing, or the single word `bang`, is a pulse
    /// - a single number is an int or float message
    /// - a leading number, or the word `list`, makes a list
    /// - any other leading word is the selector of a named message
    pub fn from_atoms(mut atoms: Vec<Atom>) -> Self {
        if atoms.is_empty() {
            return Message::Bang;
        }
        match atoms.remove(0) {
            Atom::Symbol(s) if s == "bang" && atoms.is_empty() => Message::Bang,
            Atom::Symbol(s) if s == "list" => Message::List(atoms),
            Atom::Symbol(selector) => Message::Anything {
                selector,
                args: atoms,
            },
            Atom::Int(i) if atoms.is_empty() => Message::Int(i),
            Atom::Float(f) if atoms.is_empty() => Message::Float(f),
            number => {
                atoms.insert(0, number);
                Message::List(atoms)
            }
        }
    }

    /// Split a whitespace-separated line into atoms and classify them.
    pub fn parse(line: &str) -> Self {
        Self::from_atoms(line.split_whitespace().map(Atom::parse_token).collect())
    }

    /// The scalar atoms this message carries, in order.
    ///
    /// The selector of a named message is not part of its payload.
    pub fn into_scalars(self) -> Vec<Atom> {
        match self {
            Message::Bang => Vec::new(),
            Message::Int(i) => vec![Atom::Int(i)],
            Message::Float(f) => vec![Atom::Float(f)],
            Message::List(atoms) => atoms,
            Message::Anything { args, .. } => args,
        }
    }
}

/// One inbound event: a message tagged with the channel it arrived on.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub channel: Channel,
    pub message: Message,
}

impl Event {
    pub fn new(channel: Channel, message: Message) -> Self {
        Self { channel, message }
    }

    pub fn bang(channel: Channel) -> Self {
        Self::new(channel, Message::Bang)
    }

    /// Parse `<channel> <tokens...>`, e.g. `2 selectById 42` or `1 5 3.5`.
    pub fn parse(line: &str) -> Result<Self, MessageError> {
        let line = line.trim();
        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest),
            None => (line, ""),
        };
        if head.is_empty() {
            return Err(MessageError::MissingChannel);
        }
        let index: u8 = head
            .parse()
            .map_err(|_| MessageError::UnknownChannel(head.to_string()))?;
        Ok(Self::new(Channel::try_from(index)?, Message::parse(rest)))
    }
}

/// A message sent on the single result channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outbound {
    List(Vec<Atom>),
    Bang,
}

impl fmt::Display for Outbound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outbound::Bang => f.write_str("bang"),
            Outbound::List(atoms) => {
                let parts: Vec<String> = atoms.iter().map(|a| a.to_string()).collect();
                f.write_str(&parts.join(" "))
            }
        }
    }
}
