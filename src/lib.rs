//! Read-only FTP browsing: directory listing, file retrieval, path
//! navigation and direct-link building. The desktop front end in `main.rs`
//! is a thin layer over these modules.

pub mod connection;
pub mod error;
pub mod link;
pub mod lister;
pub mod listing;
pub mod navigator;
pub mod preview;
pub mod reader;
pub mod settings;

pub use connection::{ConnectionConfig, Connector, FtpConnector, RemoteSession};
pub use error::FtpError;
pub use lister::list;
pub use listing::{DirectoryEntry, EntryKind, Listing, ListingParser, UnixListingParser};
pub use navigator::{NavCommand, Navigator, ascend, descend};
pub use reader::read;
