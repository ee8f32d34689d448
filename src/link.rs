use url::Url;

use crate::connection::ConnectionConfig;
use crate::error::{FtpError, Result};

/// Direct `ftp://` link to `remote_path` for use in an external client.
///
/// Credentials are embedded unless the session is anonymous. Nothing is
/// checked on the server.
pub fn public_link(config: &ConnectionConfig, remote_path: &str) -> Result<String> {
    let mut url = Url::parse(&format!("ftp://{}", config.host))
        .map_err(|e| FtpError::Config(format!("bad host {:?}: {}", config.host, e)))?;

    // Port 21 is the scheme default and drops out of the serialized URL
    url.set_port(Some(config.port))
        .map_err(|_| FtpError::Config(format!("cannot set port {}", config.port)))?;

    // `url` leaves '%' alone and reads '\\' as a separator for ftp, so every
    // component is escaped up front
    if !config.is_anonymous() {
        url.set_username(&urlencoding::encode(&config.username))
            .map_err(|_| FtpError::Config("cannot embed user name".to_string()))?;
        if !config.password.is_empty() {
            url.set_password(Some(&urlencoding::encode(&config.password)))
                .map_err(|_| FtpError::Config("cannot embed password".to_string()))?;
        }
    }

    url.set_path(&encode_path(remote_path));
    Ok(url.to_string())
}

fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
