//! ChanServ facade.

use std::collections::BTreeMap;

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::error;

use crate::error::{ProtocolError, Result};
use crate::response::Response;
use crate::session::Session;

/// Parsed reply to `chanserv info`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelInfo {
    /// Channel name as reported on the first line.
    pub channel: String,
    /// `key: value` lines, keys and values trimmed.
    pub fields: BTreeMap<String, String>,
}

impl ChannelInfo {
    /// Build from an info reply.
    ///
    /// The first line names the channel. Each later line is split at its
    /// first colon; lines without one are logged and skipped.
    pub fn from_response(response: &Response) -> Self {
        let mut lines = response.data.iter();
        let channel = lines
            .next()
            .and_then(|line| line.split_whitespace().next())
            .unwrap_or_default()
            .to_owned();

        let mut fields = BTreeMap::new();
        for line in lines {
            match line.split_once(':') {
                Some((key, value)) => {
                    fields.insert(key.trim().to_owned(), value.trim().to_owned());
                }
                None if !line.trim().is_empty() => error!("odd info response: {}", line),
                None => {}
            }
        }

        Self { channel, fields }
    }

    /// Look up a field.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}

/// Channel commands.
#[derive(Debug)]
pub struct ChanServ<'a, S> {
    session: &'a mut Session<S>,
}

impl<'a, S: AsyncRead + AsyncWrite + Unpin> ChanServ<'a, S> {
    /// Borrow a session for ChanServ commands.
    pub fn new(session: &'a mut Session<S>) -> Self {
        Self { session }
    }

    /// `chanserv info <channel>`.
    pub async fn info(&mut self, channel: &str) -> Result<ChannelInfo> {
        check_channel(channel)?;
        let response = self.command(&format!("info {}", channel)).await?;
        Ok(ChannelInfo::from_response(&response))
    }

    /// `chanserv say <channel> <message>`.
    pub async fn say(&mut self, channel: &str, message: &str) -> Result<Response> {
        check_channel(channel)?;
        self.command(&format!("say {} {}", channel, message)).await
    }

    /// Send `chanserv <text>`.
    pub async fn command(&mut self, text: &str) -> Result<Response> {
        self.session.send_command(&format!("chanserv {}", text)).await
    }
}

fn check_channel(channel: &str) -> Result<()> {
    if channel.is_empty() || channel.contains(char::is_whitespace) {
        return Err(ProtocolError::InvalidCommand(format!(
            "bad channel name {:?}",
            channel
        )));
    }
    Ok(())
}
