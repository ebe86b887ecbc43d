//! AuthServ facade.

use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::Result;
use crate::response::Response;
use crate::session::Session;

/// Account commands.
#[derive(Debug)]
pub struct AuthServ<'a, S> {
    session: &'a mut Session<S>,
}

impl<'a, S: AsyncRead + AsyncWrite + Unpin> AuthServ<'a, S> {
    /// Borrow a session for AuthServ commands.
    pub fn new(session: &'a mut Session<S>) -> Self {
        Self { session }
    }

    /// Log in; see [`Session::authenticate`].
    pub async fn authenticate(&mut self, username: &str, password: &str) -> Result<Response> {
        self.session.authenticate(username, password).await
    }

    /// Send `authserv <text>`.
    pub async fn command(&mut self, text: &str) -> Result<Response> {
        self.session.send_command(&format!("authserv {}", text)).await
    }
}
