//! Connection settings and the per-call FTP session.
//! Every lister/reader call opens its own session and closes it when done.

use std::fmt;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use suppaftp::FtpStream;
use suppaftp::types::FileType;

use crate::error::{FtpError, Result};

pub const DEFAULT_PORT: u16 = 21;
pub const ANONYMOUS_USER: &str = "anonymous";
pub const ANONYMOUS_PASSWORD: &str = "anonymous@";

/// Connect/read timeout bounds, in seconds
pub const MIN_TIMEOUT_SECS: u64 = 20;
pub const MAX_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub timeout_secs: u64,
}

impl ConnectionConfig {
    pub fn new(host: &str, username: &str, password: &str) -> Self {
        // Accept pasted URLs, we only need the host name
        let host = host
            .trim()
            .trim_start_matches("ftp://")
            .trim_end_matches('/')
            .to_string();

        Self {
            host,
            port: DEFAULT_PORT,
            username: username.trim().to_string(),
            password: password.to_string(),
            timeout_secs: MIN_TIMEOUT_SECS,
        }
    }

    pub fn anonymous(host: &str) -> Self {
        Self::new(host, ANONYMOUS_USER, ANONYMOUS_PASSWORD)
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Empty user names log in anonymously too
    pub fn is_anonymous(&self) -> bool {
        self.username.is_empty() || self.username.eq_ignore_ascii_case(ANONYMOUS_USER)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS))
    }

    fn login_user(&self) -> &str {
        if self.username.is_empty() {
            ANONYMOUS_USER
        } else {
            &self.username
        }
    }

    fn login_password(&self) -> &str {
        if self.is_anonymous() && self.password.is_empty() {
            ANONYMOUS_PASSWORD
        } else {
            &self.password
        }
    }
}

// Password stays out of logs and panic messages
impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// One logged-in FTP session. Used for a single operation, then closed.
pub trait RemoteSession {
    fn change_dir(&mut self, path: &str) -> Result<()>;

    /// Raw long-format `LIST` lines of the working directory, in server order
    fn list_lines(&mut self) -> Result<Vec<String>>;

    /// Binary retrieval of a whole file into memory
    fn retrieve(&mut self, path: &str) -> Result<Vec<u8>>;

    fn close(&mut self);
}

/// Opens sessions for the lister and reader.
pub trait Connector {
    type Session: RemoteSession;

    fn open(&self, config: &ConnectionConfig) -> Result<Self::Session>;
}

/// Connector backed by a fresh `suppaftp` control connection per call
#[derive(Debug, Clone, Copy, Default)]
pub struct FtpConnector;

impl Connector for FtpConnector {
    type Session = FtpStream;

    fn open(&self, config: &ConnectionConfig) -> Result<FtpStream> {
        if config.host.is_empty() {
            return Err(FtpError::Connection("host is empty".to_string()));
        }

        let timeout = config.timeout();
        let deadline = Instant::now() + timeout;
        let addrs = resolve(&config.host, config.port, timeout)?;

        let mut last_error = None;
        let mut stream = None;
        for (index, addr) in addrs.iter().enumerate() {
            // Remaining budget is shared by the addresses still to try
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                last_error = Some(format!("timed out after {}s", timeout.as_secs()));
                break;
            }
            let attempt = remaining / (addrs.len() - index) as u32;

            match FtpStream::connect_timeout(*addr, attempt) {
                Ok(ftp) => {
                    stream = Some(ftp);
                    break;
                }
                Err(e) => {
                    log::debug!("FTP: connect to {} failed: {}", addr, e);
                    last_error = Some(e.to_string());
                }
            }
        }

        let mut ftp = stream.ok_or_else(|| {
            FtpError::Connection(
                last_error.unwrap_or_else(|| format!("no address for {}", config.host)),
            )
        })?;

        // Bound every later read/write on the control connection as well
        ftp.get_ref().set_read_timeout(Some(timeout)).ok();
        ftp.get_ref().set_write_timeout(Some(timeout)).ok();

        ftp.login(config.login_user(), config.login_password())
            .map_err(|e| FtpError::Connection(format!("login failed: {}", e)))?;

        log::debug!("FTP: logged in to {} as {}", config.host, config.login_user());
        Ok(ftp)
    }
}

/// Name lookup on a helper thread so a stalled resolver cannot outlast `timeout`
fn resolve(host: &str, port: u16, timeout: Duration) -> Result<Vec<SocketAddr>> {
    let (tx, rx) = mpsc::channel();
    let target = (host.to_string(), port);
    thread::spawn(move || {
        let _ = tx.send(target.to_socket_addrs().map(|addrs| addrs.collect::<Vec<_>>()));
    });

    let addrs = match rx.recv_timeout(timeout) {
        Ok(result) => {
            result.map_err(|e| FtpError::Connection(format!("cannot resolve {}: {}", host, e)))?
        }
        Err(_) => {
            return Err(FtpError::Connection(format!(
                "resolving {} timed out after {}s",
                host,
                timeout.as_secs()
            )));
        }
    };

    if addrs.is_empty() {
        return Err(FtpError::Connection(format!("cannot resolve {}", host)));
    }
    Ok(addrs)
}

impl RemoteSession for FtpStream {
    fn change_dir(&mut self, path: &str) -> Result<()> {
        let ftp_path = if path.is_empty() { "/" } else { path };
        self.cwd(ftp_path).map_err(|e| FtpError::Path {
            path: ftp_path.to_string(),
            reason: e.to_string(),
        })
    }

    fn list_lines(&mut self) -> Result<Vec<String>> {
        self.list(None)
            .map_err(|e| FtpError::Transfer(format!("LIST failed: {}", e)))
    }

    fn retrieve(&mut self, path: &str) -> Result<Vec<u8>> {
        self.transfer_type(FileType::Binary)
            .map_err(|e| FtpError::Transfer(format!("cannot set binary mode: {}", e)))?;

        let buffer = self
            .retr_as_buffer(path)
            .map_err(|e| FtpError::Transfer(format!("RETR {} failed: {}", path, e)))?;

        Ok(buffer.into_inner())
    }

    fn close(&mut self) {
        if let Err(e) = self.quit() {
            log::debug!("FTP: quit failed: {}", e);
        }
    }
}
