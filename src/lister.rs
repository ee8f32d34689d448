use crate::connection::{ConnectionConfig, Connector, FtpConnector, RemoteSession};
use crate::error::{FtpError, Result};
use crate::listing::{Listing, ListingParser, UnixListingParser};

/// List `directory` over a fresh connection using the Unix `LIST` parser.
pub fn list(config: &ConnectionConfig, directory: &str) -> Result<Listing> {
    list_with(&FtpConnector, &UnixListingParser, config, directory)
}

/// Connect, change into `directory`, fetch `LIST`, disconnect, parse.
///
/// Nothing is returned unless all remote steps succeed; the session is closed
/// whether or not they did.
pub fn list_with<C, P>(
    connector: &C,
    parser: &P,
    config: &ConnectionConfig,
    directory: &str,
) -> Result<Listing>
where
    C: Connector,
    P: ListingParser + ?Sized,
{
    log::info!("FTP: Listing {} on {}", directory, config.host);

    let mut session = connector.open(config)?;
    let lines = session
        .change_dir(directory)
        .and_then(|_| session.list_lines());
    session.close();

    let lines = lines.inspect_err(|e| log::warn!("FTP: listing {} failed: {}", directory, e))?;
    let listing = Listing::parse(&lines, parser);

    if listing.skipped > 0 {
        log::debug!(
            "FTP: {} of {} lines skipped in {}",
            listing.skipped,
            lines.len(),
            directory
        );
    }
    log::info!("FTP: {} entries in {}", listing.len(), directory);

    Ok(listing)
}

/// Runs `list` on the blocking pool so UI executors stay responsive
pub async fn list_async(config: ConnectionConfig, directory: String) -> Result<Listing> {
    tokio::task::spawn_blocking(move || list(&config, &directory))
        .await
        .map_err(|e| FtpError::Transfer(format!("Task error: {}", e)))?
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::listing::EntryKind;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    /// Scripted in-memory server shared by the lister and reader tests
    #[derive(Default)]
    pub(crate) struct FakeServer {
        pub refuse: bool,
        pub dirs: HashMap<String, Vec<String>>,
        pub files: HashMap<String, Vec<u8>>,
        pub fail_list: bool,
        pub log: Rc<RefCell<Vec<String>>>,
    }

    pub(crate) struct FakeSession {
        dirs: HashMap<String, Vec<String>>,
        files: HashMap<String, Vec<u8>>,
        fail_list: bool,
        cwd: String,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl Connector for FakeServer {
        type Session = FakeSession;

        fn open(&self, _config: &ConnectionConfig) -> Result<FakeSession> {
            self.log.borrow_mut().push("open".to_string());
            if self.refuse {
                return Err(FtpError::Connection("refused".to_string()));
            }
            Ok(FakeSession {
                dirs: self.dirs.clone(),
                files: self.files.clone(),
                fail_list: self.fail_list,
                cwd: "/".to_string(),
                log: self.log.clone(),
            })
        }
    }

    impl RemoteSession for FakeSession {
        fn change_dir(&mut self, path: &str) -> Result<()> {
            self.log.borrow_mut().push(format!("cwd {}", path));
            if self.dirs.contains_key(path) {
                self.cwd = path.to_string();
                Ok(())
            } else {
                Err(FtpError::Path {
                    path: path.to_string(),
                    reason: "550 No such directory".to_string(),
                })
            }
        }

        fn list_lines(&mut self) -> Result<Vec<String>> {
            self.log.borrow_mut().push("list".to_string());
            if self.fail_list {
                return Err(FtpError::Transfer("425 Can't open data connection".to_string()));
            }
            Ok(self.dirs.get(&self.cwd).cloned().unwrap_or_default())
        }

        fn retrieve(&mut self, path: &str) -> Result<Vec<u8>> {
            self.log.borrow_mut().push(format!("retr {}", path));
            self.files
                .get(path)
                .cloned()
                .ok_or_else(|| FtpError::Transfer(format!("550 {}: not found", path)))
        }

        fn close(&mut self) {
            self.log.borrow_mut().push("quit".to_string());
        }
    }

    fn server() -> FakeServer {
        let mut server = FakeServer::default();
        server.dirs.insert(
            "/pub".to_string(),
            vec![
                "total 3".to_string(),
                "drwxr-xr-x 2 user group 4096 Jan 01 00:00 My Folder".to_string(),
                "-rw-r--r-- 1 user group 1234 Jan 01 00:00 report.csv".to_string(),
            ],
        );
        server
    }

    fn config() -> ConnectionConfig {
        ConnectionConfig::anonymous("ftp.example.com")
    }

    #[test]
    fn test_list_parses_and_closes() {
        let server = server();
        let listing = list_with(&server, &UnixListingParser, &config(), "/pub").unwrap();

        assert_eq!(listing.len(), 2);
        assert_eq!(listing.skipped, 1);
        assert_eq!(listing.entries[0].name, "My Folder");
        assert_eq!(listing.entries[0].kind, EntryKind::Directory);
        assert_eq!(listing.entries[1].name, "report.csv");
        assert_eq!(listing.entries[1].size.as_deref(), Some("1234"));

        assert_eq!(
            *server.log.borrow(),
            vec!["open", "cwd /pub", "list", "quit"]
        );
    }

    #[test]
    fn test_rejected_directory_is_path_error_and_closes() {
        let server = server();
        let result = list_with(&server, &UnixListingParser, &config(), "/missing");

        match result {
            Err(FtpError::Path { path, .. }) => assert_eq!(path, "/missing"),
            other => panic!("expected path error, got {:?}", other),
        }
        assert_eq!(*server.log.borrow(), vec!["open", "cwd /missing", "quit"]);
    }

    #[test]
    fn test_failed_list_returns_no_entries() {
        let mut server = server();
        server.fail_list = true;

        let result = list_with(&server, &UnixListingParser, &config(), "/pub");
        assert!(matches!(result, Err(FtpError::Transfer(_))));
        assert_eq!(
            *server.log.borrow(),
            vec!["open", "cwd /pub", "list", "quit"]
        );
    }

    #[test]
    fn test_refused_connection_never_lists() {
        let mut server = server();
        server.refuse = true;

        let result = list_with(&server, &UnixListingParser, &config(), "/pub");
        assert!(matches!(result, Err(FtpError::Connection(_))));
        assert_eq!(*server.log.borrow(), vec!["open"]);
    }

    #[test]
    fn test_custom_parser_is_used() {
        struct NamesOnly;
        impl ListingParser for NamesOnly {
            fn parse_line(&self, line: &str) -> Option<crate::listing::DirectoryEntry> {
                Some(crate::listing::DirectoryEntry {
                    name: line.to_string(),
                    kind: EntryKind::File,
                    size: None,
                    raw: line.to_string(),
                })
            }
        }

        let listing = list_with(&server(), &NamesOnly, &config(), "/pub").unwrap();
        assert_eq!(listing.len(), 3);
        assert_eq!(listing.entries[0].name, "total 3");
    }

    #[test]
    fn test_unreachable_host() {
        let config = ConnectionConfig::anonymous("127.0.0.1").with_port(1);
        let result = list(&config, "/");
        assert!(matches!(result, Err(FtpError::Connection(_))));
    }

    #[test]
    fn test_empty_host_is_connection_error() {
        let result = list(&ConnectionConfig::anonymous(""), "/");
        assert!(matches!(result, Err(FtpError::Connection(_))));
    }

    #[tokio::test]
    async fn test_list_async_unreachable_host() {
        let config = ConnectionConfig::anonymous("127.0.0.1").with_port(1);
        let result = list_async(config, "/".to_string()).await;
        assert!(matches!(result, Err(FtpError::Connection(_))));
    }
}
