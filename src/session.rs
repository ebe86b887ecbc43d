//! QServer session: socket ownership, handshake and command round-trips.
//!
//! A [`Session`] owns the stream, the receive buffer and the token
//! generator. Commands are strictly request-then-wait-for-full-reply; the
//! `&mut self` receivers make a second command impossible while one is
//! still being assembled. To share a session between tasks, wrap it in a
//! mutex.

use std::borrow::Cow;
use std::task::Poll;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::assembler::{Assembler, Outcome, TokenMatch};
use crate::error::{ProtocolError, Result};
use crate::line::{LineFramer, DEFAULT_MAX_BUFFER_LEN};
use crate::response::Response;
use crate::token::{Token, TokenGenerator};

/// Default QServer port.
pub const DEFAULT_PORT: u16 = 7702;

/// AuthServ's reply to a successful `AUTH`.
pub const AUTH_ACKNOWLEDGEMENT: &str = "I recognize you.";

const READ_CHUNK_LEN: usize = 8192;

/// Connection parameters.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionConfig {
    /// Host name or address.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// QServer password sent with `PASS`.
    pub password: String,
    /// Read deadline while waiting for a reply. `None` waits forever.
    pub read_timeout: Option<Duration>,
    /// How reply lines are matched to the active token.
    pub token_match: TokenMatch,
    /// Upper bound on unconsumed receive bytes.
    pub max_buffer_len: usize,
}

impl SessionConfig {
    /// Configuration with default timeout, matching and buffer settings.
    pub fn new(host: impl Into<String>, port: u16, password: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            password: password.into(),
            read_timeout: None,
            token_match: TokenMatch::default(),
            max_buffer_len: DEFAULT_MAX_BUFFER_LEN,
        }
    }

    /// Set the read deadline.
    pub fn with_read_timeout(mut self, limit: Duration) -> Self {
        self.read_timeout = Some(limit);
        self
    }

    /// Set the token matching mode.
    pub fn with_token_match(mut self, token_match: TokenMatch) -> Self {
        self.token_match = token_match;
        self
    }

    /// Set the receive buffer limit.
    pub fn with_max_buffer_len(mut self, max_len: usize) -> Self {
        self.max_buffer_len = max_len;
        self
    }
}

/// Session lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SessionState {
    /// Connected and `PASS` sent, not yet authenticated.
    Connected,
    /// AuthServ acknowledged the credentials.
    Authenticated,
    /// The stream has been released.
    Closed,
}

/// A QServer connection.
#[derive(Debug)]
pub struct Session<S> {
    stream: Option<S>,
    framer: LineFramer,
    tokens: TokenGenerator,
    state: SessionState,
    read_timeout: Option<Duration>,
    token_match: TokenMatch,
}

impl Session<TcpStream> {
    /// Connect over TCP and send the QServer password.
    pub async fn connect(config: &SessionConfig) -> Result<Self> {
        info!("connecting to {}:{}", config.host, config.port);
        let stream = TcpStream::connect((config.host.as_str(), config.port)).await?;

        if let Err(e) = enable_keepalive(&stream) {
            warn!("failed to enable TCP keepalive: {}", e);
        }

        Self::open(stream, config).await
    }
}

fn enable_keepalive(stream: &TcpStream) -> std::io::Result<()> {
    use socket2::{SockRef, TcpKeepalive};

    let sock = SockRef::from(stream);
    let keepalive = TcpKeepalive::new()
        .with_time(Duration::from_secs(120))
        .with_interval(Duration::from_secs(30));

    sock.set_tcp_keepalive(&keepalive)
}

impl<S: AsyncRead + AsyncWrite + Unpin> Session<S> {
    /// Wrap an established stream and send `PASS`.
    ///
    /// No reply is awaited for `PASS`; a bad password shows up as a
    /// rejection or a closed connection on the next command.
    pub async fn open(stream: S, config: &SessionConfig) -> Result<Self> {
        let mut session = Self {
            stream: Some(stream),
            framer: LineFramer::with_max_buffer_len(config.max_buffer_len),
            tokens: TokenGenerator::new(),
            state: SessionState::Connected,
            read_timeout: config.read_timeout,
            token_match: config.token_match,
        };

        session
            .write_command(&format!("PASS {}", config.password))
            .await?;
        Ok(session)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Returns `true` once AuthServ has accepted our credentials.
    pub fn is_authenticated(&self) -> bool {
        self.state == SessionState::Authenticated
    }

    /// Bytes received but not yet attributed to a finished reply.
    pub fn buffered(&self) -> &[u8] {
        self.framer.as_bytes()
    }

    /// Authenticate with AuthServ.
    ///
    /// Succeeds only if the first content line of the reply is exactly
    /// [`AUTH_ACKNOWLEDGEMENT`]. On failure the session stays connected.
    ///
    /// An empty username, or a username or password containing whitespace,
    /// is refused with [`ProtocolError::InvalidCommand`] before anything is
    /// sent, since it would change the command's arguments on the wire.
    pub async fn authenticate(&mut self, username: &str, password: &str) -> Result<Response> {
        debug!("processing AuthServ authentication request");

        if username.is_empty() || username.contains(char::is_whitespace) {
            return Err(ProtocolError::InvalidCommand(format!(
                "bad AuthServ username {:?}",
                username
            )));
        }
        if password.contains(char::is_whitespace) {
            return Err(ProtocolError::InvalidCommand(
                "AuthServ password contains whitespace".to_owned(),
            ));
        }

        let response = self
            .send_command(&format!("AuthServ AUTH {} {}", username, password))
            .await?;

        if response.first_line() == Some(AUTH_ACKNOWLEDGEMENT) {
            info!("authenticated with AuthServ as {}", username);
            self.state = SessionState::Authenticated;
            return Ok(response);
        }

        Err(ProtocolError::AuthenticationFailed(
            response.first_line().unwrap_or_default().to_owned(),
        ))
    }

    /// Send one command and wait for its complete reply.
    pub async fn send_command(&mut self, text: &str) -> Result<Response> {
        let token = self.write_command(text).await?;
        self.read_reply(&token).await
    }

    /// Release the stream. Calling this more than once is harmless.
    pub async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            debug!("closing connection to QServer");
            if let Err(e) = stream.shutdown().await {
                debug!("error shutting down stream: {}", e);
            }
        }
        self.state = SessionState::Closed;
    }

    async fn write_command(&mut self, text: &str) -> Result<Token> {
        if text.contains(['\r', '\n']) {
            return Err(ProtocolError::InvalidCommand(text.to_owned()));
        }

        let stream = self.stream.as_mut().ok_or(ProtocolError::NotConnected)?;
        let token = self.tokens.next();
        let line = format!("{} {}\n", token, text);

        debug!("sending: {} {}", token, redacted(text));
        let written = match stream.write_all(line.as_bytes()).await {
            Ok(()) => stream.flush().await,
            Err(e) => Err(e),
        };

        if let Err(e) = written {
            self.close().await;
            return Err(e.into());
        }
        Ok(token)
    }

    async fn read_reply(&mut self, token: &Token) -> Result<Response> {
        let mut assembler = Assembler::with_token_match(token.clone(), self.token_match);

        loop {
            match assembler.advance(&self.framer) {
                Poll::Ready(outcome) => {
                    let consumed = self.framer.consume(assembler.consumed());
                    debug!(
                        "processed {} bytes leaving {} bytes in the buffer",
                        consumed,
                        self.framer.len()
                    );

                    return match outcome {
                        Outcome::Complete(response) => Ok(response),
                        Outcome::Rejected(line) => {
                            self.close().await;
                            Err(ProtocolError::Rejected {
                                token: token.to_string(),
                                line,
                            })
                        }
                    };
                }
                Poll::Pending => {
                    if let Err(e) = self.framer.check_limit() {
                        self.close().await;
                        return Err(e);
                    }
                    self.fill_buffer(token).await?;
                }
            }
        }
    }

    /// Read once from the stream into the framer.
    ///
    /// Any failure here closes the session.
    async fn fill_buffer(&mut self, token: &Token) -> Result<()> {
        let read_timeout = self.read_timeout;
        let stream = self.stream.as_mut().ok_or(ProtocolError::NotConnected)?;

        let mut chunk = [0u8; READ_CHUNK_LEN];
        let read = stream.read(&mut chunk);
        let result = match read_timeout {
            Some(limit) => timeout(limit, read).await,
            None => Ok(read.await),
        };

        let err = match result {
            Ok(Ok(0)) => ProtocolError::ConnectionClosed {
                pending: self.framer.len(),
            },
            Ok(Ok(n)) => {
                self.framer.feed(&chunk[..n]);
                return Ok(());
            }
            Ok(Err(e)) => ProtocolError::Io(e),
            Err(_) => ProtocolError::Timeout {
                token: token.to_string(),
            },
        };

        self.close().await;
        Err(err)
    }
}

/// Hide secrets from debug logs.
fn redacted(text: &str) -> Cow<'_, str> {
    let mut words = text.split(' ');
    match (words.next(), words.next()) {
        (Some(cmd), _) if cmd.eq_ignore_ascii_case("PASS") => Cow::Borrowed("PASS ****"),
        (Some(service), Some(cmd))
            if service.eq_ignore_ascii_case("AuthServ") && cmd.eq_ignore_ascii_case("AUTH") =>
        {
            match words.next() {
                Some(user) => Cow::Owned(format!("{} {} {} ****", service, cmd, user)),
                None => Cow::Borrowed(text),
            }
        }
        _ => Cow::Borrowed(text),
    }
}
