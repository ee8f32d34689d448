//! Directory listing model and `LIST` line parsing.

use serde::{Deserialize, Serialize};

/// Minimum whitespace-separated fields of a Unix long listing line:
/// permissions, links, owner, group, size, month, day, time/year, name...
pub const UNIX_MIN_FIELDS: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    File,
    Directory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub name: String,
    pub kind: EntryKind,
    /// Byte size as the server printed it; `None` for directories
    pub size: Option<String>,
    /// Unparsed listing line
    pub raw: String,
}

impl DirectoryEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn size_bytes(&self) -> Option<u64> {
        self.size.as_deref().and_then(|s| s.parse().ok())
    }

    /// `.` and `..` show up in some server listings
    pub fn is_dot_entry(&self) -> bool {
        self.name == "." || self.name == ".."
    }
}

/// Turns one raw listing line into an entry, or `None` to skip it.
pub trait ListingParser {
    fn parse_line(&self, line: &str) -> Option<DirectoryEntry>;
}

/// Unix `ls -l` style lines, as sent by most servers for `LIST`.
///
/// The name is everything from the ninth field on, so names with spaces
/// survive, but an owner or group containing a space shifts every field.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnixListingParser;

impl ListingParser for UnixListingParser {
    fn parse_line(&self, line: &str) -> Option<DirectoryEntry> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < UNIX_MIN_FIELDS {
            return None;
        }

        let kind = if parts[0].starts_with('d') {
            EntryKind::Directory
        } else {
            EntryKind::File
        };

        let size = match kind {
            EntryKind::File => Some(parts[4].to_string()),
            EntryKind::Directory => None,
        };

        Some(DirectoryEntry {
            name: parts[UNIX_MIN_FIELDS - 1..].join(" "),
            kind,
            size,
            raw: line.to_string(),
        })
    }
}

/// Parsed directory contents in server order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub entries: Vec<DirectoryEntry>,
    /// Lines dropped because they did not parse (or were `.`/`..`)
    pub skipped: usize,
}

impl Listing {
    pub fn parse<S, P>(lines: &[S], parser: &P) -> Self
    where
        S: AsRef<str>,
        P: ListingParser + ?Sized,
    {
        let mut listing = Listing::default();

        for line in lines {
            let line = line.as_ref();
            match parser.parse_line(line) {
                Some(entry) if !entry.is_dot_entry() => listing.entries.push(entry),
                Some(_) => listing.skipped += 1,
                None => {
                    log::debug!("FTP: skipping unparsed listing line: {:?}", line);
                    listing.skipped += 1;
                }
            }
        }

        listing
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Human readable byte count for display
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Option<DirectoryEntry> {
        UnixListingParser.parse_line(line)
    }

    #[test]
    fn test_directory_with_spaces() {
        let entry = parse("drwxr-xr-x 2 user group 4096 Jan 01 00:00 My Folder").unwrap();
        assert_eq!(entry.name, "My Folder");
        assert_eq!(entry.kind, EntryKind::Directory);
        assert_eq!(entry.size, None);
        assert_eq!(entry.raw, "drwxr-xr-x 2 user group 4096 Jan 01 00:00 My Folder");
    }

    #[test]
    fn test_regular_file() {
        let entry = parse("-rw-r--r-- 1 user group 1234 Jan 01 00:00 report.csv").unwrap();
        assert_eq!(entry.name, "report.csv");
        assert_eq!(entry.kind, EntryKind::File);
        assert_eq!(entry.size.as_deref(), Some("1234"));
        assert_eq!(entry.size_bytes(), Some(1234));
    }

    #[test]
    fn test_non_d_permissions_are_files() {
        // Symlinks keep the arrow and target in the name
        let entry = parse("lrwxrwxrwx 1 root root 7 Mar 3 2021 bin -> usr/bin").unwrap();
        assert_eq!(entry.kind, EntryKind::File);
        assert_eq!(entry.size.as_deref(), Some("7"));
        assert_eq!(entry.name, "bin -> usr/bin");
    }

    #[test]
    fn test_short_lines_are_skipped() {
        assert!(parse("total 12").is_none());
        assert!(parse("").is_none());
        assert!(parse("-rw-r--r-- 1 user group 1234 Jan 01 report.csv").is_none());
    }

    #[test]
    fn test_runs_of_whitespace_collapse_in_name() {
        let entry = parse("-rw-r--r--   1 user   group  10 Jan  1  2024 a   b.txt").unwrap();
        assert_eq!(entry.name, "a b.txt");
        assert_eq!(entry.size.as_deref(), Some("10"));
    }

    #[test]
    fn test_owner_with_space_shifts_fields() {
        // Known limitation: the fields are positional
        let entry = parse("-rw-r--r-- 1 John Smith staff 1234 Jan 01 00:00 notes.txt").unwrap();
        assert_eq!(entry.size.as_deref(), Some("staff"));
        assert_eq!(entry.size_bytes(), None);
        assert_eq!(entry.name, "00:00 notes.txt");
    }

    #[test]
    fn test_listing_keeps_server_order_and_counts_skips() {
        let lines = vec![
            "total 8",
            "drwxr-xr-x 2 u g 4096 Jan 01 00:00 .",
            "drwxr-xr-x 2 u g 4096 Jan 01 00:00 ..",
            "-rw-r--r-- 1 u g 5 Jan 01 00:00 zeta.txt",
            "drwxr-xr-x 2 u g 4096 Jan 01 00:00 alpha",
            "garbage",
        ];
        let listing = Listing::parse(&lines, &UnixListingParser);

        let names: Vec<&str> = listing.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["zeta.txt", "alpha"]);
        assert_eq!(listing.skipped, 4);
        assert!(listing.entries[1].is_dir());
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
    }
}
