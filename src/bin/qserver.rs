//! qserver - command line SrvX QServer tool
//!
//! Connects, authenticates with AuthServ, runs one command and prints the
//! result as JSON.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use srvx_qserver::services::{ChanServ, OpServ};
use srvx_qserver::{Session, SessionConfig, DEFAULT_PORT};

/// Command line SrvX tool
#[derive(Parser, Debug)]
#[command(name = "qserver")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Host IP address
    #[arg(short, long, default_value = "127.0.0.1")]
    ipaddr: String,

    /// Host TCP port
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// QServer password
    #[arg(short = 'k', long, env = "QSERVER_PASSWORD", hide_env_values = true)]
    password: String,

    /// AuthServ username:password pair to use
    #[arg(short, long, env = "QSERVER_AUTH", hide_env_values = true)]
    auth: String,

    /// Seconds to wait for a reply before giving up
    #[arg(long)]
    timeout: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show ChanServ information for a channel
    Info {
        /// Channel name
        channel: String,
    },

    /// Have ChanServ say something in a channel
    Say {
        /// Channel name
        channel: String,
        /// Message text
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },

    /// Run an OpServ command
    Opserv {
        /// Command text
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Send a raw command and print the reply
    Raw {
        /// Command text
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
}

/// Split `user:pass` at the first colon.
fn parse_auth(auth: &str) -> Result<(&str, &str)> {
    match auth.split_once(':') {
        Some((user, pass)) if !user.is_empty() => Ok((user, pass)),
        _ => bail!("invalid authserv credentials, expected username:password"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let (user, pass) = parse_auth(&cli.auth)?;

    let mut config = SessionConfig::new(cli.ipaddr.clone(), cli.port, cli.password.clone());
    if let Some(secs) = cli.timeout {
        config = config.with_read_timeout(Duration::from_secs(secs));
    }

    let mut session = Session::connect(&config)
        .await
        .with_context(|| format!("failed to connect to {}:{}", cli.ipaddr, cli.port))?;

    let result = run(&mut session, user, pass, &cli.command).await;
    session.close().await;

    let output = result?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn run(
    session: &mut Session<tokio::net::TcpStream>,
    user: &str,
    pass: &str,
    command: &Commands,
) -> Result<serde_json::Value> {
    session
        .authenticate(user, pass)
        .await
        .context("AuthServ authentication failed")?;

    let output = match command {
        Commands::Info { channel } => {
            let info = ChanServ::new(session).info(channel).await?;
            serde_json::to_value(info)?
        }
        Commands::Say { channel, message } => {
            let response = ChanServ::new(session).say(channel, &message.join(" ")).await?;
            serde_json::to_value(response)?
        }
        Commands::Opserv { text } => {
            let response = OpServ::new(session).command(&text.join(" ")).await?;
            serde_json::to_value(response)?
        }
        Commands::Raw { text } => {
            let response = session.send_command(&text.join(" ")).await?;
            json!({ "origin": response.origin, "data": response.data })
        }
    };
    Ok(output)
}
