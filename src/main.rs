// Remove the windows_subsystem attribute during development to see console output
#![cfg_attr(target_os = "windows", windows_subsystem = "windows")]

use iced::{
    Element, Length, Task,
    widget::{Space, button, column, container, row, rule, text, text_input, tooltip},
};

use ftp_browser::settings::{AppSettings, ConnectionSettings};

mod remote_browser;

use remote_browser::{RemoteBrowser, RemoteBrowserMessage};

const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
const FONT_SIZE: u32 = 14;

pub fn main() -> iced::Result {
    // Initialize logger - show info level by default, debug if RUST_LOG is set
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    log::info!("===========================================");
    log::info!("Starting FTP Browser v{}", APP_VERSION);
    log::info!("===========================================");

    // Print some diagnostic info
    log::info!("Platform: {}", std::env::consts::OS);
    log::info!("Arch: {}", std::env::consts::ARCH);

    iced::application(FtpBrowser::new, FtpBrowser::update, FtpBrowser::view)
        .title(FtpBrowser::title)
        .window_size(iced::Size::new(1200.0, 800.0))
        .run()
}

#[derive(Debug, Clone)]
pub enum Message {
    RemoteBrowser(RemoteBrowserMessage),

    // Connection
    HostInputChanged(String),
    PortInputChanged(String),
    UserInputChanged(String),
    PasswordInputChanged(String),
    ConnectPressed,
    DisconnectPressed,

    DismissMessage,
}

#[derive(Debug, Clone)]
pub enum UserMessage {
    Error(String),
    Info(String),
}

pub struct FtpBrowser {
    settings: AppSettings,
    remote_browser: RemoteBrowser,
    connected_host: Option<String>,

    // Input fields
    host_input: String,
    port_input: String,
    user_input: String,
    password_input: String,

    user_message: Option<UserMessage>,
    // Settings of the connection in progress, saved once it lists
    pending_connection: Option<ConnectionSettings>,
}

impl FtpBrowser {
    fn new() -> (Self, Task<Message>) {
        log::info!("Initializing application...");

        let settings = match AppSettings::load() {
            Ok(s) => s,
            Err(e) => {
                log::warn!("Could not load settings: {}. Using defaults.", e);
                AppSettings::default()
            }
        };

        let mut app = Self::with_settings(settings);

        // Passwords are not stored, so only anonymous sessions can reconnect on their own
        let saved = app.settings.connection.clone();
        if !saved.host.is_empty() && saved.to_config("").is_anonymous() {
            log::info!("Auto-connecting to configured host: {}", saved.host);
            let task = app.connect(saved);
            return (app, task);
        }

        log::info!("No host configured, waiting for user input");
        (app, Task::none())
    }

    fn with_settings(settings: AppSettings) -> Self {
        Self {
            remote_browser: RemoteBrowser::new(
                &settings.preferences.start_directory,
                settings.preferences.preview_rows,
            ),
            connected_host: None,
            host_input: settings.connection.host.clone(),
            port_input: settings.connection.port.to_string(),
            user_input: settings.connection.username.clone(),
            password_input: String::new(),
            settings,
            user_message: None,
            pending_connection: None,
        }
    }

    fn title(&self) -> String {
        match &self.connected_host {
            Some(host) if self.remote_browser.is_connected() => {
                format!("FTP Browser - Connected to {}", host)
            }
            Some(host) => format!("FTP Browser - {}", host),
            None => "FTP Browser - Disconnected".to_string(),
        }
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::RemoteBrowser(msg) => {
                let task = self.remote_browser.update(msg).map(Message::RemoteBrowser);
                if self.confirm_connection() {
                    if let Err(e) = self.settings.save() {
                        log::warn!("Could not save settings: {}", e);
                    }
                }
                task
            }

            Message::HostInputChanged(value) => {
                self.host_input = value;
                Task::none()
            }

            Message::PortInputChanged(value) => {
                self.port_input = value;
                Task::none()
            }

            Message::UserInputChanged(value) => {
                self.user_input = value;
                Task::none()
            }

            Message::PasswordInputChanged(value) => {
                self.password_input = value;
                Task::none()
            }

            Message::ConnectPressed => {
                if self.remote_browser.is_busy() {
                    self.user_message = Some(UserMessage::Info(
                        "Wait for the current FTP operation to finish".to_string(),
                    ));
                    return Task::none();
                }
                if self.host_input.trim().is_empty() {
                    self.user_message = Some(UserMessage::Error("Enter a host name".to_string()));
                    return Task::none();
                }
                let port = match self.port_input.trim().parse::<u16>() {
                    Ok(port) if port > 0 => port,
                    _ => {
                        self.user_message = Some(UserMessage::Error(format!(
                            "Invalid port: {}",
                            self.port_input
                        )));
                        return Task::none();
                    }
                };

                let connection = ConnectionSettings {
                    host: self.host_input.trim().to_string(),
                    port,
                    username: self.user_input.trim().to_string(),
                    timeout_secs: self.settings.connection.timeout_secs,
                };
                self.connect(connection)
            }

            Message::DisconnectPressed => {
                log::info!("Disconnecting from {:?}", self.connected_host);
                self.connected_host = None;
                self.pending_connection = None;
                self.remote_browser.set_connection(None);
                self.user_message = Some(UserMessage::Info("Disconnected".to_string()));
                Task::none()
            }

            Message::DismissMessage => {
                self.user_message = None;
                Task::none()
            }
        }
    }

    fn connect(&mut self, connection: ConnectionSettings) -> Task<Message> {
        let config = connection.to_config(&self.password_input);
        log::info!(
            "Connecting to {}:{} as {}",
            config.host,
            config.port,
            if config.is_anonymous() {
                "anonymous"
            } else {
                config.username.as_str()
            }
        );

        self.connected_host = Some(config.host.clone());
        self.pending_connection = Some(connection);
        self.user_message = None;
        self.remote_browser.set_connection(Some(config));
        self.remote_browser
            .update(RemoteBrowserMessage::RefreshFiles)
            .map(Message::RemoteBrowser)
    }

    /// Adopts the pending connection settings once the server has listed a
    /// directory. Returns true when they should be written to disk.
    fn confirm_connection(&mut self) -> bool {
        if !self.remote_browser.is_connected() {
            return false;
        }
        match self.pending_connection.take() {
            Some(connection) => {
                self.settings.connection = connection;
                true
            }
            None => false,
        }
    }

    fn view(&self) -> Element<'_, Message> {
        let normal = FONT_SIZE;
        let small = FONT_SIZE - 2;

        let connection_bar = row![
            text("Host:").size(small),
            text_input("ftp.example.com", &self.host_input)
                .on_input(Message::HostInputChanged)
                .on_submit(Message::ConnectPressed)
                .size(normal as f32)
                .padding(4)
                .width(Length::Fixed(220.0)),
            text("Port:").size(small),
            text_input("21", &self.port_input)
                .on_input(Message::PortInputChanged)
                .size(normal as f32)
                .padding(4)
                .width(Length::Fixed(60.0)),
            text("User:").size(small),
            text_input("anonymous", &self.user_input)
                .on_input(Message::UserInputChanged)
                .size(normal as f32)
                .padding(4)
                .width(Length::Fixed(140.0)),
            text("Password:").size(small),
            text_input("password", &self.password_input)
                .on_input(Message::PasswordInputChanged)
                .on_submit(Message::ConnectPressed)
                .secure(true)
                .size(normal as f32)
                .padding(4)
                .width(Length::Fixed(140.0)),
            tooltip(
                button(text("Connect").size(normal))
                    .on_press(Message::ConnectPressed)
                    .padding([4, 10])
                    .style(button::primary),
                "Connect and list the start directory",
                tooltip::Position::Bottom,
            )
            .style(container::bordered_box),
            tooltip(
                button(text("Disconnect").size(normal))
                    .on_press_maybe(self.connected_host.as_ref().map(|_| Message::DisconnectPressed))
                    .padding([4, 10]),
                "Forget the current server",
                tooltip::Position::Bottom,
            )
            .style(container::bordered_box),
        ]
        .spacing(5)
        .align_y(iced::Alignment::Center);

        let message_bar: Element<'_, Message> = match &self.user_message {
            Some(msg) => {
                let (label, color) = match msg {
                    UserMessage::Error(e) => (e.as_str(), iced::Color::from_rgb(0.9, 0.3, 0.3)),
                    UserMessage::Info(i) => (i.as_str(), iced::Color::from_rgb(0.2, 0.5, 0.2)),
                };
                row![
                    text(label).size(normal).color(color),
                    Space::new().width(Length::Fill),
                    button(text("Dismiss").size(small))
                        .on_press(Message::DismissMessage)
                        .padding([2, 8]),
                ]
                .align_y(iced::Alignment::Center)
                .into()
            }
            None => Space::new().height(Length::Fixed(0.0)).into(),
        };

        column![
            text("FTP BROWSER (read-only)").size(normal + 4),
            connection_bar,
            message_bar,
            rule::horizontal(1),
            self.remote_browser
                .view(FONT_SIZE)
                .map(Message::RemoteBrowser),
        ]
        .spacing(5)
        .padding(10)
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ftp_browser::listing::Listing;

    fn app_with_input(host: &str) -> FtpBrowser {
        let mut app = FtpBrowser::with_settings(AppSettings::default());
        app.host_input = host.to_string();
        app.user_input = "gorden".to_string();
        app.password_input = "secret".to_string();
        app
    }

    #[test]
    fn test_failed_connect_keeps_saved_settings() {
        let mut app = app_with_input("ftp.typo.example");
        let _ = app.update(Message::ConnectPressed);
        assert!(app.pending_connection.is_some());

        let _ = app.remote_browser.update(RemoteBrowserMessage::FilesLoaded(Err(
            "FTP connection failed: cannot resolve ftp.typo.example".to_string(),
        )));
        assert!(!app.confirm_connection());
        assert_eq!(app.settings.connection.host, "");
    }

    #[test]
    fn test_successful_connect_adopts_settings_once() {
        let mut app = app_with_input("ftp.example.com");
        let _ = app.update(Message::ConnectPressed);

        let _ = app
            .remote_browser
            .update(RemoteBrowserMessage::FilesLoaded(Ok(Listing::default())));
        assert!(app.confirm_connection());
        assert_eq!(app.settings.connection.host, "ftp.example.com");
        assert_eq!(app.settings.connection.username, "gorden");
        assert!(!app.confirm_connection());
    }

    #[test]
    fn test_invalid_port_does_not_connect() {
        let mut app = app_with_input("ftp.example.com");
        app.port_input = "ftp".to_string();
        let _ = app.update(Message::ConnectPressed);
        assert!(app.pending_connection.is_none());
        assert!(matches!(app.user_message, Some(UserMessage::Error(_))));
    }
}
