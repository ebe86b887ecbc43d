//! Sans-IO reply assembler.
//!
//! The [`Assembler`] is the protocol state machine for a single command. It
//! does no I/O: the caller feeds the [`LineFramer`], calls
//! [`Assembler::advance`], and reads more from the socket whenever the
//! assembler answers [`Poll::Pending`]. Once a terminal line is seen the
//! caller consumes [`Assembler::consumed`] bytes from the framer.
//!
//! # Example
//!
//! ```
//! use std::task::Poll;
//! use srvx_qserver::assembler::{Assembler, Outcome};
//! use srvx_qserver::line::LineFramer;
//! use srvx_qserver::token::Token;
//!
//! let mut framer = LineFramer::new();
//! let mut assembler = Assembler::new(Token::from_number(1));
//!
//! framer.feed(b"serv GS00001 S :line one\n");
//! assert!(assembler.advance(&framer).is_pending());
//!
//! framer.feed(b"serv GS00001 E :line two\nGS09999 S\n");
//! let Poll::Ready(Outcome::Complete(response)) = assembler.advance(&framer) else {
//!     panic!("reply should be complete");
//! };
//! assert_eq!(response.origin, "serv");
//! assert_eq!(response.data, vec!["line one", "line two"]);
//!
//! framer.consume(assembler.consumed());
//! assert_eq!(framer.as_bytes(), b"GS09999 S\n");
//! ```

use std::mem;
use std::task::Poll;

use tracing::debug;

use crate::line::LineFramer;
use crate::response::{ReplyLine, Response, ResponseCode};
use crate::token::Token;

/// How a line is recognised as belonging to the active command.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TokenMatch {
    /// The token must be a whole field in the first or second position.
    #[default]
    Field,
    /// The token may appear anywhere in the line; the code is always read
    /// from the second field.
    Substring,
}

/// Assembler state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssemblerState {
    /// Every available complete line has been walked; need another read.
    AwaitingMoreData,
    /// Walking the line list.
    ScanningLines,
    /// An `E` line for the active token was found.
    Done,
    /// An `X` line for the active token was found.
    Failed,
}

/// Terminal result of one command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The reply finished with `E`.
    Complete(Response),
    /// The server answered with `X`. Carries the rejection line.
    Rejected(String),
}

/// Per-command reply state machine.
#[derive(Debug)]
pub struct Assembler {
    token: Token,
    token_match: TokenMatch,
    state: AssemblerState,
    scanned: usize,
    content: Vec<String>,
    outcome: Option<Outcome>,
}

impl Assembler {
    /// Create an assembler for `token` using field matching.
    pub fn new(token: Token) -> Self {
        Self::with_token_match(token, TokenMatch::default())
    }

    /// Create an assembler with an explicit matching mode.
    pub fn with_token_match(token: Token, token_match: TokenMatch) -> Self {
        Self {
            token,
            token_match,
            state: AssemblerState::AwaitingMoreData,
            scanned: 0,
            content: Vec::new(),
            outcome: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> AssemblerState {
        self.state
    }

    /// Bytes from the front of the framer that belong to this reply.
    pub fn consumed(&self) -> usize {
        self.scanned
    }

    /// Walk newly completed lines in `framer`.
    ///
    /// The framer must not be consumed from between calls. After a terminal
    /// outcome further calls return the same outcome without scanning.
    pub fn advance(&mut self, framer: &LineFramer) -> Poll<Outcome> {
        if let Some(outcome) = &self.outcome {
            return Poll::Ready(outcome.clone());
        }

        self.state = AssemblerState::ScanningLines;

        for line in framer.complete_lines_from(self.scanned) {
            self.scanned = line.end();
            let reply = ReplyLine::parse(&line.text);

            let Some(code) = self.response_code(&reply) else {
                self.content.push(reply.raw.to_owned());
                continue;
            };

            debug!("matched on token {}", self.token);
            match code {
                ResponseCode::Rejected => {
                    debug!("got X line, command rejected");
                    return self.finish(
                        AssemblerState::Failed,
                        Outcome::Rejected(reply.raw.to_owned()),
                    );
                }
                ResponseCode::Sent => {
                    debug!("got S line, processing more");
                    self.push_framing_payload(&reply);
                }
                ResponseCode::End => {
                    debug!("got E line, ending response");
                    self.push_framing_payload(&reply);
                    let response = Response::from_content_lines(mem::take(&mut self.content));
                    return self.finish(AssemblerState::Done, Outcome::Complete(response));
                }
                ResponseCode::Other(_) | ResponseCode::Absent => {
                    debug!("unexpected line: {:?}", reply.raw);
                    self.content.push(reply.raw.to_owned());
                }
            }
        }

        self.state = AssemblerState::AwaitingMoreData;
        Poll::Pending
    }

    /// Response code of a line carrying the active token, `None` otherwise.
    fn response_code(&self, reply: &ReplyLine<'_>) -> Option<ResponseCode> {
        let token = self.token.as_str();
        let code_field = match self.token_match {
            TokenMatch::Field => reply.fields.iter().take(2).position(|f| *f == token)? + 1,
            TokenMatch::Substring => {
                if !reply.raw.contains(token) {
                    return None;
                }
                1
            }
        };
        Some(ResponseCode::parse(reply.fields.get(code_field).copied()))
    }

    fn push_framing_payload(&mut self, reply: &ReplyLine<'_>) {
        if reply.payload.is_some() {
            self.content.push(reply.raw.to_owned());
        }
    }

    fn finish(&mut self, state: AssemblerState, outcome: Outcome) -> Poll<Outcome> {
        self.state = state;
        self.outcome = Some(outcome.clone());
        Poll::Ready(outcome)
    }
}
