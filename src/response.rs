//! Reply lines, response codes and assembled responses.
//!
//! Inbound lines have the shape:
//!
//! ```text
//! <origin> <token> <code> :<content>
//! ```
//!
//! Bare framing lines (`<token> <code>`) carry no content at all. The parser
//! here is deliberately loose: only the token and the code field are
//! load-bearing, everything else is tolerated.

use nom::{
    bytes::complete::{take_until, take_while1},
    character::complete::{char, multispace0},
    combinator::{opt, rest},
    error::{context, VerboseError},
    multi::many0,
    sequence::preceded,
    IResult,
};
use tracing::warn;

type ParseResult<I, O> = IResult<I, O, VerboseError<I>>;

/// Single-character framing tag following the token on a reply line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResponseCode {
    /// `S`: the reply has started, more lines follow.
    Sent,
    /// `E`: end of reply.
    End,
    /// `X`: the server rejected the command.
    Rejected,
    /// Any other field; the line is ordinary content.
    Other(String),
    /// Nothing follows the token.
    Absent,
}

impl ResponseCode {
    /// Classify the field that follows the token.
    pub fn parse(field: Option<&str>) -> Self {
        match field {
            Some("S") => Self::Sent,
            Some("E") => Self::End,
            Some("X") => Self::Rejected,
            Some(other) => Self::Other(other.to_owned()),
            None => Self::Absent,
        }
    }
}

/// A reply line split into whitespace fields and an optional payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplyLine<'a> {
    /// The whole line.
    pub raw: &'a str,
    /// Whitespace-separated fields of the whole line.
    pub fields: Vec<&'a str>,
    /// Text after the first `:`, untrimmed.
    pub payload: Option<&'a str>,
}

fn field(input: &str) -> ParseResult<&str, &str> {
    take_while1(|c: char| !c.is_whitespace())(input)
}

fn parse_fields(input: &str) -> ParseResult<&str, Vec<&str>> {
    context("parsing reply fields", many0(preceded(multispace0, field)))(input)
}

fn parse_payload(input: &str) -> ParseResult<&str, Option<&str>> {
    context(
        "parsing reply payload",
        opt(preceded(take_until(":"), preceded(char(':'), rest))),
    )(input)
}

impl<'a> ReplyLine<'a> {
    /// Split a line into fields and payload.
    pub fn parse(raw: &'a str) -> Self {
        let fields = parse_fields(raw)
            .map(|(_, fields)| fields)
            .unwrap_or_else(|_| raw.split_whitespace().collect());
        let payload = parse_payload(raw).map(|(_, p)| p).unwrap_or(None);
        Self {
            raw,
            fields,
            payload,
        }
    }

    /// First field of the line.
    pub fn origin(&self) -> &'a str {
        self.fields.first().copied().unwrap_or("")
    }

    /// Trimmed payload, or the whole trimmed line when there is no `:`.
    pub fn content(&self) -> &'a str {
        match self.payload {
            Some(p) => p.trim(),
            None => self.raw.trim(),
        }
    }

    /// Returns `true` if the line has nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.fields.is_empty()
    }
}

/// The assembled result of one command.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Response {
    /// Sender identity taken from the first content line.
    pub origin: String,
    /// One entry per content line, payload only.
    pub data: Vec<String>,
}

impl Response {
    /// Build a response from raw content lines, in order.
    ///
    /// Blank lines are skipped. A line without a `:` separator is logged and
    /// kept whole.
    pub fn from_content_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut response = Response::default();
        let mut origin = None;

        for line in lines {
            let reply = ReplyLine::parse(line.as_ref());
            if reply.is_blank() {
                continue;
            }
            if origin.is_none() {
                origin = Some(reply.origin().to_owned());
            }
            if reply.payload.is_none() {
                warn!("reply line without payload separator: {:?}", reply.raw);
            }
            response.data.push(reply.content().to_owned());
        }

        response.origin = origin.unwrap_or_default();
        response
    }

    /// The first content line, if any.
    pub fn first_line(&self) -> Option<&str> {
        self.data.first().map(String::as_str)
    }

    /// Returns `true` if the reply carried no content.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
