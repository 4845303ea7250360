use std::{
    collections::BTreeMap,
    fs::{read_to_string, write},
    path::PathBuf,
};

use serde::{Deserialize, Serialize};

use crate::error::QualiError;

/// Vault-level settings threaded through every engine operation.
///
/// All folder values are vault-relative paths with `/` separators and no
/// trailing slash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Folder whose files represent coding categories.
    pub coding_folder: String,
    /// Folder whose subfolders define extraction types (one template each).
    pub extraction_folder: String,
    /// Folder receiving pre-merge backup copies.
    pub backup_folder: String,
    /// Frontmatter keys skipped entirely during a merge.
    pub merge_ignore_keys: Vec<String>,
    /// Marker line stripped from bodies when concatenating merged files.
    pub boilerplate_marker: String,
    /// Filename (without folder) of the template defining each extraction
    /// type's schema.
    pub template_filename: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            coding_folder: "Codes".to_string(),
            extraction_folder: "Extraction".to_string(),
            backup_folder: "Backups".to_string(),
            merge_ignore_keys: vec!["extraction-date".to_string()],
            boilerplate_marker: "Paragraphs coded with this code:".to_string(),
            template_filename: "Template.md".to_string(),
        }
    }
}

impl Settings {
    /// Whether `path` lives under the coding folder.
    pub fn is_code_path(&self, path: &str) -> bool {
        path.starts_with(&format!("{}/", self.coding_folder))
    }

    /// Whether `path` lives under the extraction folder.
    pub fn is_extraction_path(&self, path: &str) -> bool {
        path.starts_with(&format!("{}/", self.extraction_folder))
    }

    /// Whether `path` is a plain data file (neither code nor extraction nor
    /// backup).
    pub fn is_data_path(&self, path: &str) -> bool {
        !self.is_code_path(path)
            && !self.is_extraction_path(path)
            && !path.starts_with(&format!("{}/", self.backup_folder))
    }
}

/// Reads and writes [Settings] as a `[settings]` table in a TOML file.
#[derive(Debug, Serialize, Deserialize)]
pub struct TomlSettingsProvider {
    path: PathBuf,
}

impl TomlSettingsProvider {
    pub fn new(path: PathBuf) -> Self {
        TomlSettingsProvider { path }
    }

    pub fn get_settings(&self) -> Result<Settings, QualiError> {
        tracing::debug!("Attempting to read settings from: {:?}", &self.path);
        if !self.path.exists() {
            tracing::debug!("Config file not found, returning defaults.");
            return Ok(Settings::default());
        }
        let content = read_to_string(&self.path)?;
        let config: BTreeMap<String, Settings> = toml::from_str(&content)?;
        config
            .get("settings")
            .cloned()
            .ok_or_else(|| QualiError::NotFound("settings not found in config".to_string()))
    }

    pub fn set_settings(&self, settings: Settings) -> Result<(), QualiError> {
        tracing::debug!("Attempting to write settings to: {:?}", &self.path);
        let mut config = BTreeMap::new();
        config.insert("settings".to_string(), settings);
        let toml_string = toml::to_string(&config)?;
        write(&self.path, toml_string)?;
        Ok(())
    }
}
