//! # srvx-qserver
//!
//! A client for the SrvX QServer protocol: a newline-delimited, token
//! correlated request/response protocol spoken over one TCP connection to
//! an IRC services daemon.
//!
//! ## Features
//!
//! - Correlation token generation
//! - Incremental line framing that keeps trailing bytes for the next reply
//! - A sans-IO reply assembler (`S` continue, `E` end, `X` reject)
//! - Optional Tokio session with AuthServ, ChanServ and OpServ facades
//! - Optional `qserver` command-line tool (feature `cli`)

#![deny(clippy::all)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! ## Quick Start
//!
//! ### Assembling a reply without I/O
//!
//! ```rust
//! use std::task::Poll;
//! use srvx_qserver::{Assembler, LineFramer, Outcome, Token};
//!
//! let mut framer = LineFramer::new();
//! framer.feed(b"GS00042 S\nAuthServ :I recognize you.\nGS00042 E\n");
//!
//! let mut assembler = Assembler::new(Token::from_number(42));
//! if let Poll::Ready(Outcome::Complete(response)) = assembler.advance(&framer) {
//!     assert_eq!(response.data, vec!["I recognize you."]);
//! }
//! ```
//!
//! ### Talking to a server
//!
//! ```no_run
//! use srvx_qserver::services::ChanServ;
//! use srvx_qserver::{Session, SessionConfig};
//!
//! # async fn run() -> srvx_qserver::error::Result<()> {
//! let config = SessionConfig::new("127.0.0.1", 7702, "qserver-password");
//! let mut session = Session::connect(&config).await?;
//! session.authenticate("admin", "secret").await?;
//!
//! let info = ChanServ::new(&mut session).info("#srvx").await?;
//! println!("{:?}", info);
//!
//! session.close().await;
//! # Ok(())
//! # }
//! ```

pub mod assembler;
pub mod error;
pub mod line;
pub mod response;
pub mod token;

#[cfg(feature = "tokio")]
pub mod services;
#[cfg(feature = "tokio")]
pub mod session;

pub use self::assembler::{Assembler, AssemblerState, Outcome, TokenMatch};
pub use self::error::ProtocolError;
pub use self::line::{LineFramer, RawLine};
pub use self::response::{ReplyLine, Response, ResponseCode};
pub use self::token::{Token, TokenGenerator};

#[cfg(feature = "tokio")]
pub use self::services::{AuthServ, ChanServ, ChannelInfo, OpServ};
#[cfg(feature = "tokio")]
pub use self::session::{Session, SessionConfig, SessionState, AUTH_ACKNOWLEDGEMENT, DEFAULT_PORT};
