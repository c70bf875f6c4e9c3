//! Input events and the line format that carries them.
//!
//! One event per line. A `#` starts a trailing comment; blank and
//! comment-only lines carry no event. Submissions are whitespace-separated
//! (`L <B|S> <id> <price> <qty>` for plain limits, `I <B|S> <id> <price>
//! <qty> <peak>` for icebergs); cancellations are `C<id>`, with optional
//! whitespace after the `C`.

use crate::order::{Id, Order, Side};
use std::str::SplitWhitespace;
use thiserror::Error;

/// A decoded input event.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Event {
    /// Submission of a plain or iceberg limit order.
    Submit(Order),
    /// Cancellation of a resting order.
    Cancel(Id),
}

/// Errors produced while decoding a line.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("unrecognized event {0:?}")]
    UnknownEvent(String),
    #[error("unrecognized side {0:?}")]
    UnknownSide(String),
    #[error("missing {0} field")]
    MissingField(&'static str),
    #[error("could not parse {0} field as an unsigned integer")]
    InvalidField(&'static str),
}

fn num_field(fields: &mut SplitWhitespace<'_>, name: &'static str) -> Result<u32, ParseError> {
    let raw = fields.next().ok_or(ParseError::MissingField(name))?;
    raw.parse().map_err(|_| ParseError::InvalidField(name))
}

fn side_field(fields: &mut SplitWhitespace<'_>) -> Result<Side, ParseError> {
    match fields.next().ok_or(ParseError::MissingField("side"))? {
        "B" => Ok(Side::Buy),
        "S" => Ok(Side::Sell),
        other => Err(ParseError::UnknownSide(other.to_string())),
    }
}

/// Decode one input line. Returns `Ok(None)` for blank and comment-only
/// lines.
pub fn parse_line(line: &str) -> Result<Option<Event>, ParseError> {
    let line = line.split('#').next().unwrap_or("").trim();
    if line.is_empty() {
        return Ok(None);
    }

    if let Some(rest) = line.strip_prefix('C') {
        let raw = rest.trim();
        if raw.is_empty() {
            return Err(ParseError::MissingField("id"));
        }
        let id = raw.parse().map_err(|_| ParseError::InvalidField("id"))?;
        return Ok(Some(Event::Cancel(id)));
    }

    let mut fields = line.split_whitespace();
    let kind = fields.next().unwrap_or("");
    match kind {
        "L" => {
            let side = side_field(&mut fields)?;
            let id = num_field(&mut fields, "id")?;
            let price = num_field(&mut fields, "price")?;
            let qty = num_field(&mut fields, "quantity")?;
            Ok(Some(Event::Submit(Order::limit(id, side, price, qty))))
        }
        "I" => {
            let side = side_field(&mut fields)?;
            let id = num_field(&mut fields, "id")?;
            let price = num_field(&mut fields, "price")?;
            let qty = num_field(&mut fields, "quantity")?;
            let peak = num_field(&mut fields, "peak")?;
            Ok(Some(Event::Submit(Order::iceberg(
                id, side, price, qty, peak,
            ))))
        }
        other => Err(ParseError::UnknownEvent(other.to_string())),
    }
}
