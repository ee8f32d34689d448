//! File content preview
//! Picks a renderer from the file extension: CSV files become a table,
//! common image formats are decoded for display, everything else is text.

use image::GenericImageView;

/// How a file will be previewed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewKind {
    Table,
    Image,
    Text,
}

impl PreviewKind {
    pub fn for_name(name: &str) -> Self {
        let ext = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "csv" => PreviewKind::Table,
            "jpg" | "jpeg" | "png" | "gif" | "bmp" => PreviewKind::Image,
            _ => PreviewKind::Text,
        }
    }
}

/// Decoded preview content
#[derive(Debug, Clone)]
pub enum ContentPreview {
    /// CSV data; first record is the header
    Table {
        filename: String,
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    /// Image file with raw bytes and dimensions
    Image {
        filename: String,
        data: Vec<u8>,
        width: u32,
        height: u32,
    },
    /// Text file content with filename and content
    Text {
        filename: String,
        content: String,
        line_count: usize,
    },
}

impl ContentPreview {
    pub fn filename(&self) -> &str {
        match self {
            ContentPreview::Table { filename, .. }
            | ContentPreview::Image { filename, .. }
            | ContentPreview::Text { filename, .. } => filename,
        }
    }
}

/// Build the preview for a downloaded file
pub fn build_preview(filename: &str, data: &[u8]) -> Result<ContentPreview, String> {
    match PreviewKind::for_name(filename) {
        PreviewKind::Table => load_table(filename, data),
        PreviewKind::Image => load_image(filename, data),
        PreviewKind::Text => Ok(load_text(filename, data)),
    }
}

pub fn load_table(filename: &str, data: &[u8]) -> Result<ContentPreview, String> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(data);

    let headers = reader
        .headers()
        .map_err(|e| format!("Failed to read CSV header: {}", e))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| format!("Failed to parse CSV: {}", e))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(ContentPreview::Table {
        filename: filename.to_string(),
        headers,
        rows,
    })
}

pub fn load_image(filename: &str, data: &[u8]) -> Result<ContentPreview, String> {
    // Decode image to get dimensions
    let img =
        image::load_from_memory(data).map_err(|e| format!("Failed to decode image: {}", e))?;

    Ok(ContentPreview::Image {
        filename: filename.to_string(),
        data: data.to_vec(),
        width: img.width(),
        height: img.height(),
    })
}

pub fn load_text(filename: &str, data: &[u8]) -> ContentPreview {
    let content = decode_text(data);
    let line_count = content.lines().count();

    ContentPreview::Text {
        filename: filename.to_string(),
        content,
        line_count,
    }
}

/// UTF-8 decode that drops invalid byte sequences instead of failing
pub fn decode_text(data: &[u8]) -> String {
    match std::str::from_utf8(data) {
        Ok(s) => s.to_string(),
        Err(_) => String::from_utf8_lossy(data)
            .chars()
            .filter(|&c| c != char::REPLACEMENT_CHARACTER)
            .collect(),
    }
}

/// Async wrapper, decoding large files is not free
pub async fn build_preview_async(filename: String, data: Vec<u8>) -> Result<ContentPreview, String> {
    tokio::task::spawn_blocking(move || build_preview(&filename, &data))
        .await
        .map_err(|e| format!("Task error: {}", e))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(PreviewKind::for_name("report.csv"), PreviewKind::Table);
        assert_eq!(PreviewKind::for_name("REPORT.CSV"), PreviewKind::Table);
        assert_eq!(PreviewKind::for_name("photo.JPG"), PreviewKind::Image);
        assert_eq!(PreviewKind::for_name("logo.png"), PreviewKind::Image);
        assert_eq!(PreviewKind::for_name("scan.jpeg"), PreviewKind::Image);
        assert_eq!(PreviewKind::for_name("readme"), PreviewKind::Text);
        assert_eq!(PreviewKind::for_name("1KB.zip"), PreviewKind::Text);
    }

    #[test]
    fn test_table_preview() {
        let data = b"name,size\nalpha,1\nbeta,2,extra\n";
        match build_preview("report.csv", data).unwrap() {
            ContentPreview::Table {
                filename,
                headers,
                rows,
            } => {
                assert_eq!(filename, "report.csv");
                assert_eq!(headers, vec!["name", "size"]);
                assert_eq!(rows.len(), 2);
                assert_eq!(rows[1], vec!["beta", "2", "extra"]);
            }
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn test_image_preview_reports_dimensions() {
        let img = image::RgbImage::new(3, 2);
        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), image::ImageOutputFormat::Png)
            .unwrap();

        match build_preview("pixel.png", &png).unwrap() {
            ContentPreview::Image {
                width,
                height,
                data,
                ..
            } => {
                assert_eq!((width, height), (3, 2));
                assert_eq!(data, png);
            }
            other => panic!("expected image, got {:?}", other),
        }
    }

    #[test]
    fn test_broken_image_is_an_error() {
        assert!(build_preview("broken.jpg", b"not an image").is_err());
    }

    #[test]
    fn test_text_drops_invalid_utf8() {
        let data = b"hello\xff\nworld\n";
        match build_preview("notes.txt", data).unwrap() {
            ContentPreview::Text {
                content,
                line_count,
                ..
            } => {
                assert_eq!(content, "hello\nworld\n");
                assert_eq!(line_count, 2);
            }
            other => panic!("expected text, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_async_preview() {
        let preview = build_preview_async("a.log".to_string(), b"x".to_vec())
            .await
            .unwrap();
        assert_eq!(preview.filename(), "a.log");
    }
}
