//! Current-directory state and the path arithmetic behind it.
//! Navigation never touches the server; the new path is listed afterwards.

pub const ROOT: &str = "/";

/// Path of `child` inside `current`. A trailing slash on `current` is ignored.
pub fn descend(current: &str, child: &str) -> String {
    format!("{}/{}", current.trim_end_matches('/'), child)
}

/// Parent of `current`; the root is its own parent.
pub fn ascend(current: &str) -> String {
    let mut segments: Vec<&str> = current.split('/').collect();
    segments.pop();

    let parent = segments.join("/");
    if parent.is_empty() {
        ROOT.to_string()
    } else {
        parent
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavCommand {
    OpenSubdir(String),
    GoParent,
    SetPath(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigator {
    current_directory: String,
}

impl Default for Navigator {
    fn default() -> Self {
        Self {
            current_directory: ROOT.to_string(),
        }
    }
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &str {
        &self.current_directory
    }

    pub fn is_root(&self) -> bool {
        self.current_directory == ROOT
    }

    pub fn can_go_parent(&self) -> bool {
        !self.is_root()
    }

    /// Full path of an entry in the current directory
    pub fn child_path(&self, name: &str) -> String {
        descend(&self.current_directory, name)
    }

    pub fn apply(&mut self, command: NavCommand) -> &str {
        match command {
            NavCommand::OpenSubdir(name) => {
                self.current_directory = descend(&self.current_directory, &name);
            }
            NavCommand::GoParent => {
                if self.can_go_parent() {
                    self.current_directory = ascend(&self.current_directory);
                }
            }
            NavCommand::SetPath(path) => {
                self.current_directory = normalize_input(&path);
            }
        }
        log::debug!("Current directory: {}", self.current_directory);
        &self.current_directory
    }
}

// Typed paths are kept absolute, without trailing slashes
fn normalize_input(path: &str) -> String {
    let path = path.trim().trim_end_matches('/');
    if path.is_empty() {
        ROOT.to_string()
    } else if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}
