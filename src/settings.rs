use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use log::{debug, info, warn, error};

use crate::config::{DEFAULT_OUTPUT_SUBDIR, SETTINGS_DIR_NAME};

/// User-specific settings that persist across annotation sessions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    /// Sub-directory of the input directory used when no output directory is given
    #[serde(default = "default_output_subdir")]
    pub output_subdir: String,

    /// Open each image in the system image viewer
    #[serde(default)]
    pub open_image_viewer: bool,

    /// Print the pixel size of each image
    #[serde(default = "default_show_image_size")]
    pub show_image_size: bool,
}

fn default_output_subdir() -> String {
    DEFAULT_OUTPUT_SUBDIR.to_string()
}

fn default_show_image_size() -> bool {
    true
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            output_subdir: default_output_subdir(),
            open_image_viewer: false,
            show_image_size: default_show_image_size(),
        }
    }
}

impl UserSettings {
    /// Get the path to the settings file
    /// On macOS: ~/Library/Application Support/SetcardAnnotator/settings.yaml
    /// On Linux: ~/.config/SetcardAnnotator/settings.yaml
    /// On Windows: C:\Users\<user>\AppData\Roaming\SetcardAnnotator\settings.yaml
    pub fn settings_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."));

        config_dir.join(SETTINGS_DIR_NAME).join("settings.yaml")
    }

    /// Load settings from the YAML file
    /// If custom_path is provided, uses that path; otherwise uses the default settings path
    pub fn load(custom_path: Option<&Path>) -> Self {
        let path = match custom_path {
            Some(p) => {
                info!("Using custom settings path: {}", p.display());
                p.to_path_buf()
            }
            None => Self::settings_path(),
        };

        if !path.exists() {
            debug!("Settings file not found at {:?}, using defaults", path);
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(contents) => Self::from_yaml(&contents).unwrap_or_else(|e| {
                error!("Failed to parse settings file at {:?}: {}", path, e);
                warn!("Using default settings");
                Self::default()
            }),
            Err(e) => {
                error!("Failed to read settings file at {:?}: {}", path, e);
                warn!("Using default settings");
                Self::default()
            }
        }
    }

    fn from_yaml(contents: &str) -> Result<Self, serde_yaml::Error> {
        // An empty file deserializes to unit, not to a mapping
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings: UserSettings = serde_yaml::from_str(contents)?;
        debug!(
            "Settings: output_subdir={}, open_image_viewer={}, show_image_size={}",
            settings.output_subdir, settings.open_image_viewer, settings.show_image_size
        );
        Ok(settings)
    }

    /// Write a commented settings file with the current values.
    /// An existing file is left alone.
    pub fn write_template(&self, path: &Path) -> Result<(), String> {
        if path.exists() {
            return Err(format!("Settings file already exists: {}", path.display()));
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .map_err(|e| format!("Failed to create settings directory: {}", e))?;
            }
        }

        fs::write(path, self.to_yaml_with_comments())
            .map_err(|e| format!("Failed to write settings file: {}", e))?;

        info!("Saved settings to {:?}", path);
        Ok(())
    }

    /// Generate YAML content with comments for new files
    fn to_yaml_with_comments(&self) -> String {
        format!(
            r#"# Set card annotator user settings
# This file is loaded automatically when the annotator starts.
# Settings specified here will override the default values.

# Sub-directory of the image directory where annotations are saved
# when no --output-dir is given
output_subdir: "{}"

# Open each image in the system image viewer as it comes up
open_image_viewer: {}

# Print the pixel size of each image next to its path
show_image_size: {}
"#,
            self.output_subdir,
            self.open_image_viewer,
            self.show_image_size
        )
    }
}
