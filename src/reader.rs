use crate::connection::{ConnectionConfig, Connector, FtpConnector, RemoteSession};
use crate::error::{FtpError, Result};

/// Download `remote_path` into memory over a fresh connection.
/// The whole file is buffered; there is no size cap.
pub fn read(config: &ConnectionConfig, remote_path: &str) -> Result<Vec<u8>> {
    read_with(&FtpConnector, config, remote_path)
}

pub fn read_with<C: Connector>(
    connector: &C,
    config: &ConnectionConfig,
    remote_path: &str,
) -> Result<Vec<u8>> {
    log::info!("FTP: Downloading {} from {}", remote_path, config.host);

    let mut session = connector.open(config)?;
    let data = session.retrieve(remote_path);
    session.close();

    match &data {
        Ok(bytes) => log::info!("FTP: Downloaded {} ({} bytes)", remote_path, bytes.len()),
        Err(e) => log::warn!("FTP: download of {} failed: {}", remote_path, e),
    }
    data
}

/// Runs `read` on the blocking pool
pub async fn read_async(config: ConnectionConfig, remote_path: String) -> Result<Vec<u8>> {
    tokio::task::spawn_blocking(move || read(&config, &remote_path))
        .await
        .map_err(|e| FtpError::Transfer(format!("Task error: {}", e)))?
}
