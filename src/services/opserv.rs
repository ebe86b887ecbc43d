//! OpServ facade.

use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::Result;
use crate::response::Response;
use crate::session::Session;

/// Operator commands. Replies are passed through unparsed.
#[derive(Debug)]
pub struct OpServ<'a, S> {
    session: &'a mut Session<S>,
}

impl<'a, S: AsyncRead + AsyncWrite + Unpin> OpServ<'a, S> {
    /// Borrow a session for OpServ commands.
    pub fn new(session: &'a mut Session<S>) -> Self {
        Self { session }
    }

    /// Send `opserv <text>`.
    pub async fn command(&mut self, text: &str) -> Result<Response> {
        self.session.send_command(&format!("opserv {}", text)).await
    }
}
