use crate::identity::HostVersion;
use crate::layout::DEFAULT_HIDDEN_COMMANDS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const SETTINGS_FILE: &str = "settings.json";
pub const LAYOUT_FILE_NAME: &str = "CustomizeToolbar.dat";
pub const BUTTONS_FILE_NAME: &str = "CustomizeToolbar.btn";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Settings {
    /// Directory holding the layout and custom button files. Relative paths
    /// are resolved against the working directory of the host.
    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,
    #[serde(default = "default_layout_file")]
    pub layout_file: String,
    #[serde(default = "default_buttons_file")]
    pub buttons_file: String,
    /// Version of the host application. Decides how many plugin command ids
    /// carry a menu entry.
    #[serde(default)]
    pub host_version: HostVersion,
    /// When enabled the logger is initialised at debug level.
    /// Defaults to `false` when the field is missing in the settings file.
    #[serde(default)]
    pub debug_logging: bool,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    /// Built-in commands left off the toolbar on first run.
    #[serde(default = "default_hidden_commands")]
    pub bootstrap_hidden_commands: Vec<u32>,
}

fn default_config_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_layout_file() -> String {
    LAYOUT_FILE_NAME.to_string()
}

fn default_buttons_file() -> String {
    BUTTONS_FILE_NAME.to_string()
}

fn default_hidden_commands() -> Vec<u32> {
    DEFAULT_HIDDEN_COMMANDS.to_vec()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            layout_file: default_layout_file(),
            buttons_file: default_buttons_file(),
            host_version: HostVersion::default(),
            debug_logging: false,
            log_file: None,
            bootstrap_hidden_commands: default_hidden_commands(),
        }
    }
}

impl Settings {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn layout_path(&self) -> PathBuf {
        self.config_dir.join(&self.layout_file)
    }

    pub fn buttons_path(&self) -> PathBuf {
        self.config_dir.join(&self.buttons_file)
    }
}

#[cfg(test)]
mod tests {
    use super::{Settings, LAYOUT_FILE_NAME};
    use crate::identity::HostVersion;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let loaded = Settings::load(dir.path().join("nope.json")).expect("load");
        assert_eq!(loaded, Settings::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"config_dir":"cfg","host_version":{"major":7,"minor":9}}"#,
        )
        .expect("write");

        let loaded = Settings::load(&path).expect("load");
        assert_eq!(loaded.host_version, HostVersion { major: 7, minor: 9 });
        assert_eq!(loaded.layout_file, LAYOUT_FILE_NAME);
        assert!(!loaded.bootstrap_hidden_commands.is_empty());
        assert_eq!(
            loaded.layout_path(),
            std::path::Path::new("cfg").join(LAYOUT_FILE_NAME)
        );
    }

    #[test]
    fn save_then_load_preserves_fields() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("settings.json");
        let mut settings = Settings::default();
        settings.debug_logging = true;
        settings.bootstrap_hidden_commands = vec![42001];

        settings.save(&path).expect("save");
        let loaded = Settings::load(&path).expect("load");
        assert_eq!(loaded, settings);
    }
}
