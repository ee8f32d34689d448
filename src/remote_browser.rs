use iced::{
    Element, Length, Task,
    widget::{
        Column, Row, Space, button, column, container, image, row, rule, scrollable, text,
        text_input, tooltip,
    },
};
use std::path::PathBuf;

use ftp_browser::connection::ConnectionConfig;
use ftp_browser::link;
use ftp_browser::lister;
use ftp_browser::listing::{DirectoryEntry, Listing, format_size};
use ftp_browser::navigator::{NavCommand, Navigator};
use ftp_browser::preview::{self, ContentPreview, PreviewKind};
use ftp_browser::reader;

const CELL_WIDTH: f32 = 120.0;

#[derive(Debug, Clone)]
pub enum RemoteBrowserMessage {
    RefreshFiles,
    FilesLoaded(Result<Listing, String>),
    EntrySelected(String),
    NavigateUp,
    PathInputChanged(String),
    PathSubmitted,
    FilterChanged(String),
    // Preview of the selected file
    PreviewLoaded(Result<LoadedFile, String>),
    ClosePreview,
    // Direct link / local copy of the selected file
    CopyLink,
    OpenExternally,
    SaveCopy,
    SaveCopyPathSelected(Option<PathBuf>),
    SaveCopyComplete(Result<String, String>),
}

/// A downloaded file together with its decoded preview. The bytes are kept
/// when decoding fails so a local copy can still be saved.
#[derive(Debug, Clone)]
pub struct LoadedFile {
    pub remote_path: String,
    pub data: Vec<u8>,
    pub preview: Result<ContentPreview, String>,
}

pub struct RemoteBrowser {
    navigator: Navigator,
    start_directory: String,
    connection: Option<ConnectionConfig>,
    is_connected: bool,
    files: Vec<DirectoryEntry>,
    skipped: usize,
    selected_file: Option<String>,
    path_input: String,
    filter: String,
    status_message: Option<String>,
    error_message: Option<String>,
    is_loading: bool,
    // Content preview state
    preview: Option<LoadedFile>,
    image_handle: Option<image::Handle>,
    preview_loading: bool,
    preview_rows: usize,
}

impl RemoteBrowser {
    pub fn new(start_directory: &str, preview_rows: usize) -> Self {
        let mut navigator = Navigator::new();
        navigator.apply(NavCommand::SetPath(start_directory.to_string()));

        Self {
            path_input: navigator.current().to_string(),
            start_directory: navigator.current().to_string(),
            navigator,
            connection: None,
            is_connected: false,
            files: Vec::new(),
            skipped: 0,
            selected_file: None,
            filter: String::new(),
            status_message: Some("Not connected".to_string()),
            error_message: None,
            is_loading: false,
            preview: None,
            image_handle: None,
            preview_loading: false,
            preview_rows,
        }
    }

    /// Switch to a new server (or none). Browsing restarts at the start directory.
    pub fn set_connection(&mut self, connection: Option<ConnectionConfig>) {
        self.connection = connection;
        self.is_connected = false;
        self.files.clear();
        self.skipped = 0;
        self.close_preview();
        self.error_message = None;
        self.navigator
            .apply(NavCommand::SetPath(self.start_directory.clone()));
        self.path_input = self.navigator.current().to_string();

        if self.connection.is_none() {
            self.status_message = Some("Not connected".to_string());
        }
    }

    pub fn is_connected(&self) -> bool {
        self.is_connected
    }

    /// One remote operation at a time
    pub fn is_busy(&self) -> bool {
        self.is_loading || self.preview_loading
    }

    pub fn current_path(&self) -> &str {
        self.navigator.current()
    }

    pub fn update(&mut self, message: RemoteBrowserMessage) -> Task<RemoteBrowserMessage> {
        match message {
            RemoteBrowserMessage::RefreshFiles => {
                if self.is_busy() {
                    log::debug!("Refresh ignored, an FTP operation is running");
                    return Task::none();
                }
                if let Some(config) = &self.connection {
                    self.is_loading = true;
                    self.status_message = Some("Loading...".to_string());
                    self.error_message = None;
                    Task::perform(
                        fetch_listing(config.clone(), self.navigator.current().to_string()),
                        RemoteBrowserMessage::FilesLoaded,
                    )
                } else {
                    self.status_message = Some("Not connected".to_string());
                    self.is_connected = false;
                    Task::none()
                }
            }

            RemoteBrowserMessage::FilesLoaded(result) => {
                self.is_loading = false;
                if self.connection.is_none() {
                    // Disconnected while the listing was running
                    return Task::none();
                }
                match result {
                    Ok(listing) => {
                        self.files = listing.entries;
                        self.skipped = listing.skipped;
                        self.is_connected = true;
                        self.status_message = Some(format!(
                            "{} items in {}",
                            self.files.len(),
                            self.navigator.current()
                        ));
                    }
                    Err(e) => {
                        // No partial listings
                        self.files.clear();
                        self.skipped = 0;
                        self.is_connected = false;
                        self.status_message = None;
                        self.error_message = Some(format!("FTP listing failed: {}", e));
                    }
                }
                Task::none()
            }

            RemoteBrowserMessage::EntrySelected(name) => {
                if self.is_busy() {
                    return Task::none();
                }
                let Some(entry) = self.files.iter().find(|f| f.name == name) else {
                    return Task::none();
                };

                if entry.is_dir() {
                    self.navigator.apply(NavCommand::OpenSubdir(name));
                    self.path_input = self.navigator.current().to_string();
                    self.close_preview();
                    return self.update(RemoteBrowserMessage::RefreshFiles);
                }

                let Some(config) = &self.connection else {
                    return Task::none();
                };
                let remote_path = self.navigator.child_path(&name);
                self.selected_file = Some(remote_path.clone());
                self.preview = None;
                self.image_handle = None;
                self.preview_loading = true;
                self.error_message = None;
                self.status_message = Some(format!("Downloading {}...", name));
                Task::perform(
                    fetch_preview(config.clone(), remote_path, name),
                    RemoteBrowserMessage::PreviewLoaded,
                )
            }

            RemoteBrowserMessage::NavigateUp => {
                if self.is_busy() || !self.navigator.can_go_parent() {
                    return Task::none();
                }
                self.navigator.apply(NavCommand::GoParent);
                self.path_input = self.navigator.current().to_string();
                self.close_preview();
                self.update(RemoteBrowserMessage::RefreshFiles)
            }

            RemoteBrowserMessage::PathInputChanged(value) => {
                self.path_input = value;
                Task::none()
            }

            RemoteBrowserMessage::PathSubmitted => {
                if self.is_busy() {
                    return Task::none();
                }
                self.navigator
                    .apply(NavCommand::SetPath(self.path_input.clone()));
                self.path_input = self.navigator.current().to_string();
                self.close_preview();
                self.update(RemoteBrowserMessage::RefreshFiles)
            }

            RemoteBrowserMessage::FilterChanged(value) => {
                self.filter = value;
                Task::none()
            }

            RemoteBrowserMessage::PreviewLoaded(result) => {
                self.preview_loading = false;
                if self.connection.is_none() {
                    return Task::none();
                }
                match result {
                    Ok(loaded) => {
                        self.status_message = Some(format!(
                            "Loaded {} ({})",
                            loaded.remote_path,
                            format_size(loaded.data.len() as u64)
                        ));
                        self.image_handle = match &loaded.preview {
                            Ok(ContentPreview::Image { data, .. }) => {
                                Some(image::Handle::from_bytes(data.clone()))
                            }
                            _ => None,
                        };
                        if let Err(e) = &loaded.preview {
                            self.error_message = Some(format!("Preview failed: {}", e));
                        }
                        self.preview = Some(loaded);
                    }
                    Err(e) => {
                        self.status_message = None;
                        self.error_message = Some(format!("FTP read failed: {}", e));
                    }
                }
                Task::none()
            }

            RemoteBrowserMessage::ClosePreview => {
                self.close_preview();
                Task::none()
            }

            RemoteBrowserMessage::CopyLink => match self.selected_link() {
                Some(link) => {
                    self.status_message = Some("Link copied to clipboard".to_string());
                    iced::clipboard::write(link)
                }
                None => Task::none(),
            },

            RemoteBrowserMessage::OpenExternally => {
                if let Some(link) = self.selected_link() {
                    log::info!("Opening {} in external client", self.selected_file_display());
                    if let Err(e) = open::that(&link) {
                        self.error_message = Some(format!("Cannot open link: {}", e));
                    }
                }
                Task::none()
            }

            RemoteBrowserMessage::SaveCopy => {
                let Some(loaded) = &self.preview else {
                    return Task::none();
                };
                let default_name = file_name(&loaded.remote_path).to_string();
                Task::perform(
                    async move {
                        rfd::AsyncFileDialog::new()
                            .set_title("Save a local copy")
                            .set_file_name(&default_name)
                            .save_file()
                            .await
                            .map(|handle| handle.path().to_path_buf())
                    },
                    RemoteBrowserMessage::SaveCopyPathSelected,
                )
            }

            RemoteBrowserMessage::SaveCopyPathSelected(path) => {
                if let (Some(path), Some(loaded)) = (path, &self.preview) {
                    self.status_message = Some("Saving...".to_string());
                    return Task::perform(
                        save_local_copy(path, loaded.data.clone()),
                        RemoteBrowserMessage::SaveCopyComplete,
                    );
                }
                Task::none()
            }

            RemoteBrowserMessage::SaveCopyComplete(result) => {
                match result {
                    Ok(msg) => {
                        self.status_message = Some(msg);
                    }
                    Err(e) => {
                        self.error_message = Some(format!("Save failed: {}", e));
                    }
                }
                Task::none()
            }
        }
    }

    fn close_preview(&mut self) {
        self.preview = None;
        self.image_handle = None;
        self.selected_file = None;
    }

    /// `ftp://` link of the selected file
    pub fn selected_link(&self) -> Option<String> {
        let config = self.connection.as_ref()?;
        let path = self.selected_file.as_deref()?;
        match link::public_link(config, path) {
            Ok(link) => Some(link),
            Err(e) => {
                log::warn!("Cannot build link for {}: {}", path, e);
                None
            }
        }
    }

    fn selected_file_display(&self) -> &str {
        self.selected_file.as_deref().unwrap_or("")
    }

    pub fn view(&self, font_size: u32) -> Element<'_, RemoteBrowserMessage> {
        let small = (font_size.saturating_sub(2)).max(8);
        let normal = font_size;

        // Navigation bar with path entry and filter
        let nav_bar = row![
            tooltip(
                button(text("Up").size(normal))
                    .on_press_maybe(
                        (self.navigator.can_go_parent() && !self.is_busy())
                            .then_some(RemoteBrowserMessage::NavigateUp)
                    )
                    .padding([4, 8]),
                "Go to parent folder",
                tooltip::Position::Bottom,
            )
            .style(container::bordered_box),
            tooltip(
                button(text("Refresh").size(normal))
                    .on_press(RemoteBrowserMessage::RefreshFiles)
                    .padding([4, 8]),
                "List this directory again",
                tooltip::Position::Bottom,
            )
            .style(container::bordered_box),
            text_input("/remote/path", &self.path_input)
                .on_input(RemoteBrowserMessage::PathInputChanged)
                .on_submit(RemoteBrowserMessage::PathSubmitted)
                .size(normal as f32)
                .padding(4)
                .width(Length::Fill),
            text("Filter:").size(small),
            text_input("filter...", &self.filter)
                .on_input(RemoteBrowserMessage::FilterChanged)
                .size(normal as f32)
                .padding(4)
                .width(Length::Fixed(120.0)),
        ]
        .spacing(5)
        .align_y(iced::Alignment::Center);

        let file_list: Element<'_, RemoteBrowserMessage> = if self.files.is_empty() {
            container(if self.is_loading {
                text("Loading...").size(normal)
            } else if self.connection.is_none() {
                text("Connect to an FTP server to browse files").size(normal)
            } else if self.error_message.is_some() {
                text("Listing unavailable").size(normal)
            } else {
                text("Empty directory").size(normal)
            })
            .padding(10)
            .into()
        } else {
            let filter_lower = self.filter.to_lowercase();
            let items: Vec<Element<'_, RemoteBrowserMessage>> = self
                .files
                .iter()
                .filter(|f| {
                    filter_lower.is_empty() || f.name.to_lowercase().contains(&filter_lower)
                })
                .map(|entry| self.view_entry(entry, font_size))
                .collect();

            scrollable(
                Column::with_children(items)
                    .spacing(2)
                    .padding(iced::Padding::new(5.0).right(15.0)),
            )
            .height(Length::Fill)
            .into()
        };

        let left_pane = container(
            column![nav_bar, rule::horizontal(1), file_list]
                .spacing(5)
                .height(Length::Fill),
        )
        .width(Length::FillPortion(2));

        let right_pane = container(self.view_preview(font_size))
            .width(Length::FillPortion(3))
            .height(Length::Fill);

        // Status bar
        let skipped_note = if self.skipped > 0 {
            format!("{} unparsed lines skipped", self.skipped)
        } else {
            String::new()
        };

        let status_bar = row![
            if let Some(err) = &self.error_message {
                text(err)
                    .size(normal)
                    .color(iced::Color::from_rgb(0.9, 0.3, 0.3))
            } else {
                text(self.status_message.as_deref().unwrap_or("")).size(normal)
            },
            Space::new().width(Length::Fill),
            text(skipped_note).size(small),
        ]
        .spacing(10)
        .align_y(iced::Alignment::Center);

        column![
            row![left_pane, rule::vertical(1), right_pane]
                .spacing(5)
                .height(Length::Fill),
            rule::horizontal(1),
            status_bar,
        ]
        .spacing(5)
        .padding(5)
        .into()
    }

    fn view_entry<'a>(
        &'a self,
        entry: &'a DirectoryEntry,
        font_size: u32,
    ) -> Element<'a, RemoteBrowserMessage> {
        let small = (font_size.saturating_sub(2)).max(8);
        let normal = font_size;
        let tiny = (font_size.saturating_sub(3)).max(7);

        let is_selected = !entry.is_dir()
            && self.selected_file.as_deref() == Some(self.navigator.child_path(&entry.name).as_str());

        // File type label
        let type_label = if entry.is_dir() {
            "DIR"
        } else {
            match PreviewKind::for_name(&entry.name) {
                PreviewKind::Table => "CSV",
                PreviewKind::Image => "IMG",
                PreviewKind::Text => "",
            }
        };

        let size_label = entry
            .size_bytes()
            .map(format_size)
            .or_else(|| entry.size.clone())
            .unwrap_or_default();

        let action_button: Element<'_, RemoteBrowserMessage> = if entry.is_dir() {
            tooltip(
                button(text("Open").size(small))
                    .on_press(RemoteBrowserMessage::EntrySelected(entry.name.clone()))
                    .padding([2, 8]),
                "Open folder",
                tooltip::Position::Top,
            )
            .style(container::bordered_box)
            .into()
        } else {
            tooltip(
                button(text("View").size(small))
                    .on_press(RemoteBrowserMessage::EntrySelected(entry.name.clone()))
                    .padding([2, 8]),
                "Download and preview",
                tooltip::Position::Top,
            )
            .style(container::bordered_box)
            .into()
        };

        row![
            // Clickable filename
            button(text(truncate_name(&entry.name, 45)).size(normal))
                .on_press(RemoteBrowserMessage::EntrySelected(entry.name.clone()))
                .padding([4, 6])
                .width(Length::Fill)
                .style(if is_selected {
                    button::primary
                } else {
                    button::text
                }),
            text(type_label).size(tiny).width(Length::Fixed(32.0)),
            text(size_label).size(tiny).width(Length::Fixed(70.0)),
            action_button,
        ]
        .spacing(4)
        .align_y(iced::Alignment::Center)
        .into()
    }

    fn view_preview(&self, font_size: u32) -> Element<'_, RemoteBrowserMessage> {
        let small = (font_size.saturating_sub(2)).max(8);
        let normal = font_size;

        let Some(selected) = self.selected_file.as_deref() else {
            return container(text("Select a file to preview").size(normal))
                .padding(20)
                .center_x(Length::Fill)
                .into();
        };

        let info = match self.preview.as_ref().map(|loaded| &loaded.preview) {
            Some(Ok(ContentPreview::Table { rows, .. })) => format!("TABLE - {} rows", rows.len()),
            Some(Ok(ContentPreview::Image { width, height, .. })) => {
                format!("IMAGE - {}x{}", width, height)
            }
            Some(Ok(ContentPreview::Text { line_count, .. })) => {
                format!("TEXT - {} lines", line_count)
            }
            Some(Err(_)) => "NO PREVIEW".to_string(),
            None => String::new(),
        };

        let header = row![
            text(truncate_name(file_name(selected), 40)).size(normal + 2),
            Space::new().width(Length::Fill),
            text(info).size(small),
            Space::new().width(Length::Fixed(10.0)),
            tooltip(
                button(text("Close").size(small))
                    .on_press(RemoteBrowserMessage::ClosePreview)
                    .padding([4, 10]),
                "Close preview",
                tooltip::Position::Left,
            )
            .style(container::bordered_box),
        ]
        .spacing(5)
        .align_y(iced::Alignment::Center);

        // Direct link for external clients, available before and without a download
        let link_text = self.selected_link().unwrap_or_default();
        let link_row = row![
            text(link_text).size(small).width(Length::Fill),
            tooltip(
                button(text("Copy link").size(small))
                    .on_press(RemoteBrowserMessage::CopyLink)
                    .padding([4, 8]),
                "Copy the ftp:// link",
                tooltip::Position::Bottom,
            )
            .style(container::bordered_box),
            tooltip(
                button(text("Open").size(small))
                    .on_press(RemoteBrowserMessage::OpenExternally)
                    .padding([4, 8]),
                "Open in external FTP client",
                tooltip::Position::Bottom,
            )
            .style(container::bordered_box),
            tooltip(
                button(text("Save copy").size(small))
                    .on_press_maybe(
                        self.preview
                            .as_ref()
                            .map(|_| RemoteBrowserMessage::SaveCopy)
                    )
                    .padding([4, 8]),
                "Save the downloaded file locally",
                tooltip::Position::Bottom,
            )
            .style(container::bordered_box),
        ]
        .spacing(5)
        .align_y(iced::Alignment::Center);

        let body: Element<'_, RemoteBrowserMessage> = if self.preview_loading {
            container(text("Downloading...").size(normal))
                .padding(20)
                .center_x(Length::Fill)
                .into()
        } else {
            match self.preview.as_ref().map(|loaded| &loaded.preview) {
                None => container(text("File could not be read").size(normal))
                    .padding(20)
                    .center_x(Length::Fill)
                    .into(),
                Some(Err(e)) => container(text(format!("Cannot preview this file: {}", e)).size(normal))
                    .padding(20)
                    .center_x(Length::Fill)
                    .into(),
                Some(Ok(preview)) => self.view_content(preview, font_size),
            }
        };

        column![header, link_row, rule::horizontal(1), body]
            .spacing(5)
            .padding(10)
            .height(Length::Fill)
            .into()
    }

    fn view_content<'a>(
        &'a self,
        preview: &'a ContentPreview,
        font_size: u32,
    ) -> Element<'a, RemoteBrowserMessage> {
        let small = (font_size.saturating_sub(2)).max(8);
        let normal = font_size;

        match preview {
            ContentPreview::Table { headers, rows, .. } => {
                let mut lines: Vec<Element<'_, RemoteBrowserMessage>> =
                    vec![table_row(headers, normal), rule::horizontal(1).into()];
                lines.extend(rows.iter().take(self.preview_rows).map(|r| table_row(r, small)));
                if rows.len() > self.preview_rows {
                    lines.push(
                        text(format!("Showing {} of {} rows", self.preview_rows, rows.len()))
                            .size(small)
                            .into(),
                    );
                }
                scrollable(
                    Column::with_children(lines)
                        .spacing(2)
                        .padding(iced::Padding::new(0.0).right(15.0)),
                )
                .height(Length::Fill)
                .into()
            }
            ContentPreview::Image { .. } => match &self.image_handle {
                Some(handle) => container(
                    image(handle.clone())
                        .width(Length::Fill)
                        .height(Length::Fill),
                )
                .center_x(Length::Fill)
                .center_y(Length::Fill)
                .into(),
                None => text("Image unavailable").size(normal).into(),
            },
            ContentPreview::Text { content, .. } => scrollable(
                container(text(content).size(small)).padding(iced::Padding::new(0.0).right(15.0)),
            )
            .height(Length::Fill)
            .into(),
        }
    }
}

fn table_row(cells: &[String], size: u32) -> Element<'_, RemoteBrowserMessage> {
    Row::with_children(cells.iter().map(|cell| -> Element<'_, RemoteBrowserMessage> {
        text(cell).size(size).width(Length::Fixed(CELL_WIDTH)).into()
    }))
    .spacing(8)
    .into()
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

// Char-based so multi-byte names never split mid-character
fn truncate_name(name: &str, max_len: usize) -> String {
    if name.chars().count() > max_len {
        let head: String = name.chars().take(max_len - 3).collect();
        format!("{}...", head)
    } else {
        name.to_string()
    }
}

async fn fetch_listing(config: ConnectionConfig, path: String) -> Result<Listing, String> {
    lister::list_async(config, path)
        .await
        .map_err(|e| e.to_string())
}

async fn fetch_preview(
    config: ConnectionConfig,
    remote_path: String,
    name: String,
) -> Result<LoadedFile, String> {
    let data = reader::read_async(config, remote_path.clone())
        .await
        .map_err(|e| e.to_string())?;
    // Decode failures still hand back the bytes
    let preview = preview::build_preview_async(name, data.clone()).await;

    Ok(LoadedFile {
        remote_path,
        data,
        preview,
    })
}

async fn save_local_copy(path: PathBuf, data: Vec<u8>) -> Result<String, String> {
    tokio::fs::write(&path, &data)
        .await
        .map_err(|e| format!("Cannot write {}: {}", path.display(), e))?;
    log::info!("Saved {} bytes to {}", data.len(), path.display());
    Ok(format!("Saved: {}", path.display()))
}
