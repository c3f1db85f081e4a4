use super::CircuitController;
use crate::config::HarvestConfig;
use crate::error::HarvestError;
use async_trait::async_trait;
use log::{debug, info};
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

/// Tor's default rate limit: at most one NEWNYM per this interval
pub const NEWNYM_WAIT: Duration = Duration::from_secs(10);

/// Credential sent with `AUTHENTICATE`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authentication {
    None,
    Password(String),
    Cookie(Vec<u8>),
}

impl Authentication {
    /// Password wins over cookie; neither means no credential
    pub async fn from_config(config: &HarvestConfig) -> Result<Self, HarvestError> {
        if let Some(password) = &config.control_password {
            return Ok(Authentication::Password(password.clone()));
        }
        if let Some(path) = &config.cookie_path {
            let cookie = tokio::fs::read(path).await?;
            return Ok(Authentication::Cookie(cookie));
        }
        Ok(Authentication::None)
    }

    fn command(&self) -> String {
        match self {
            Authentication::None => "AUTHENTICATE".to_string(),
            Authentication::Password(password) => {
                let escaped = password.replace('\\', "\\\\").replace('"', "\\\"");
                format!("AUTHENTICATE \"{}\"", escaped)
            }
            Authentication::Cookie(cookie) => {
                let hex: String = cookie.iter().map(|b| format!("{:02x}", b)).collect();
                format!("AUTHENTICATE {}", hex)
            }
        }
    }
}

/// Client for the Tor control port.
///
/// The connection lives as long as the controller and is closed on drop.
pub struct TorController {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    last_newnym: Option<Instant>,
    cooldown: Duration,
}

impl TorController {
    pub async fn connect(address: &str) -> Result<Self, HarvestError> {
        let stream = TcpStream::connect(address)
            .await
            .map_err(HarvestError::ProxyConnectError)?;
        let (reader, writer) = stream.into_split();

        info!("Connected to Tor control port at {}", address);
        Ok(Self {
            reader: BufReader::new(reader),
            writer,
            last_newnym: None,
            cooldown: NEWNYM_WAIT,
        })
    }

    /// Override the NEWNYM rate limit assumed by [`newnym_wait`](Self::newnym_wait)
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub async fn authenticate(&mut self, auth: &Authentication) -> Result<(), HarvestError> {
        self.command(&auth.command()).await?;
        debug!("Authenticated with Tor control port");
        Ok(())
    }

    /// Ask Tor for new circuits
    pub async fn signal_newnym(&mut self) -> Result<(), HarvestError> {
        self.command("SIGNAL NEWNYM").await?;
        self.last_newnym = Some(Instant::now());
        Ok(())
    }

    /// Time left until Tor will honour another NEWNYM
    pub fn newnym_wait(&self) -> Duration {
        match self.last_newnym {
            Some(at) => self.cooldown.saturating_sub(at.elapsed()),
            None => Duration::ZERO,
        }
    }

    /// Close the control connection politely
    pub async fn quit(mut self) -> Result<(), HarvestError> {
        self.command("QUIT").await?;
        Ok(())
    }

    /// Send one command and read its reply; anything but 250 is an error
    async fn command(&mut self, line: &str) -> Result<Vec<String>, HarvestError> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\r\n").await?;
        self.writer.flush().await?;

        let reply = self.read_reply().await?;
        let status = reply.last().map(|l| &l[..3]).unwrap_or_default();
        if status != "250" {
            return Err(HarvestError::ProxyControlError(reply.join(" ")));
        }
        Ok(reply)
    }

    /// Read lines until the final `NNN ` line of a reply
    async fn read_reply(&mut self) -> Result<Vec<String>, HarvestError> {
        let mut lines = Vec::new();
        let mut in_data = false;

        loop {
            let mut line = String::new();
            if self.reader.read_line(&mut line).await? == 0 {
                return Err(HarvestError::ProxyControlError(
                    "control connection closed".to_string(),
                ));
            }
            let line = line.trim_end_matches(['\r', '\n']).to_string();

            if in_data {
                in_data = line != ".";
                continue;
            }
            if line.len() < 4 || !line.is_char_boundary(3) {
                return Err(HarvestError::ProxyControlError(format!(
                    "malformed reply line: {}",
                    line
                )));
            }

            let separator = line.as_bytes()[3];
            lines.push(line);
            match separator {
                b' ' => return Ok(lines),
                b'+' => in_data = true,
                _ => {}
            }
        }
    }
}

#[async_trait]
impl CircuitController for TorController {
    async fn rotate(&mut self) -> Result<Duration, HarvestError> {
        self.signal_newnym().await?;
        Ok(self.newnym_wait())
    }
}
