/// Configuration loading and management for the completion engine
use crate::error::{CompletionError, CompletionResult};
use crate::language::LanguageVariant;
use crate::providers::KeywordTable;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Placeholder names offered inside a `#define` replacement list
pub const DEFAULT_MACRO_PLACEHOLDERS: &[&str] = &["__VA_ARGS__", "__VA_OPT__"];

/// File stems probed by [`ConfigLoader::load_from_directory`]
const SETTINGS_FILE_STEM: &str = "completion";

/// Engine settings
///
/// Every field has a default, so a configuration file only needs to name what
/// it overrides:
///
/// ```yaml
/// case_sensitive: false
/// case_sensitivity:
///   text/x-c: true
/// variant: c
/// keyword_table: keywords.yaml
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionSettings {
    /// Case sensitivity for content types without an explicit entry
    pub case_sensitive: bool,
    /// Case sensitivity keyed by content type (e.g. `text/x-c++`)
    pub case_sensitivity: HashMap<String, bool>,
    /// Restrict candidates to the keywords legal in this variant
    pub variant: Option<LanguageVariant>,
    pub macro_placeholders: Vec<String>,
    /// Keyword table to load instead of the built-in one; relative paths are
    /// resolved against the settings file's directory
    pub keyword_table: Option<PathBuf>,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            case_sensitivity: HashMap::new(),
            variant: None,
            macro_placeholders: DEFAULT_MACRO_PLACEHOLDERS
                .iter()
                .map(|name| name.to_string())
                .collect(),
            keyword_table: None,
        }
    }
}

impl CompletionSettings {
    /// Resolve case sensitivity for a content type
    pub fn case_sensitive(&self, content_type: &str) -> bool {
        self.case_sensitivity
            .get(content_type)
            .copied()
            .unwrap_or(self.case_sensitive)
    }

    pub fn with_case_sensitivity(mut self, content_type: impl Into<String>, sensitive: bool) -> Self {
        self.case_sensitivity.insert(content_type.into(), sensitive);
        self
    }

    pub fn with_variant(mut self, variant: LanguageVariant) -> Self {
        self.variant = Some(variant);
        self
    }

    /// Load the configured keyword table, or the built-in one when none is set
    pub fn load_keyword_table(&self) -> CompletionResult<KeywordTable> {
        match &self.keyword_table {
            Some(path) => ConfigLoader::load_table(path),
            None => Ok(KeywordTable::builtin()),
        }
    }
}

/// Completion configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load settings from a YAML file
    pub fn load_from_yaml(path: &Path) -> CompletionResult<CompletionSettings> {
        let content = std::fs::read_to_string(path)?;
        let settings: CompletionSettings = serde_yaml::from_str(&content)?;
        Self::finish(settings, path)
    }

    /// Load settings from a JSON file
    pub fn load_from_json(path: &Path) -> CompletionResult<CompletionSettings> {
        let content = std::fs::read_to_string(path)?;
        let settings: CompletionSettings = serde_json::from_str(&content)?;
        Self::finish(settings, path)
    }

    /// Load settings from a string
    ///
    /// A relative `keyword_table` path is left as written.
    pub fn load_from_string(content: &str, format: ConfigFormat) -> CompletionResult<CompletionSettings> {
        let settings = match format {
            ConfigFormat::Yaml => serde_yaml::from_str(content)?,
            ConfigFormat::Json => serde_json::from_str(content)?,
        };
        Self::validate_settings(&settings)?;
        Ok(settings)
    }

    /// Load `completion.yaml`, `completion.yml` or `completion.json` from a
    /// directory, in that order
    pub fn load_from_directory(dir: &Path) -> CompletionResult<CompletionSettings> {
        if !dir.is_dir() {
            return Err(CompletionError::ConfigError(format!(
                "Configuration directory not found: {}",
                dir.display()
            )));
        }

        for ext in ["yaml", "yml"] {
            let path = dir.join(format!("{}.{}", SETTINGS_FILE_STEM, ext));
            if path.exists() {
                return Self::load_from_yaml(&path);
            }
        }

        let json_path = dir.join(format!("{}.json", SETTINGS_FILE_STEM));
        if json_path.exists() {
            return Self::load_from_json(&json_path);
        }

        Err(CompletionError::ConfigError(format!(
            "No completion settings found in {}",
            dir.display()
        )))
    }

    /// Load settings from a directory, falling back to defaults when the
    /// directory holds no settings file
    pub fn load_or_default(dir: &Path) -> CompletionSettings {
        match Self::load_from_directory(dir) {
            Ok(settings) => settings,
            Err(err) => {
                tracing::debug!(dir = %dir.display(), error = %err, "Using default completion settings");
                CompletionSettings::default()
            }
        }
    }

    /// Load a keyword table, picking the format from the file extension
    pub fn load_table(path: &Path) -> CompletionResult<KeywordTable> {
        let format = ConfigFormat::from_path(path).ok_or_else(|| {
            CompletionError::ConfigError(format!(
                "Unsupported keyword table format: {}",
                path.display()
            ))
        })?;
        let content = std::fs::read_to_string(path)?;
        Self::load_table_from_string(&content, format)
    }

    /// Load a keyword table from a string
    pub fn load_table_from_string(content: &str, format: ConfigFormat) -> CompletionResult<KeywordTable> {
        let table = match format {
            ConfigFormat::Yaml => serde_yaml::from_str(content)?,
            ConfigFormat::Json => serde_json::from_str(content)?,
        };
        Self::validate_table(&table)?;
        Ok(table)
    }

    /// Validate settings
    pub fn validate_settings(settings: &CompletionSettings) -> CompletionResult<()> {
        let mut seen = HashSet::new();
        for name in &settings.macro_placeholders {
            if name.trim().is_empty() {
                return Err(CompletionError::ConfigError(
                    "Macro placeholder names cannot be empty".to_string(),
                ));
            }
            if !seen.insert(name.as_str()) {
                return Err(CompletionError::ConfigError(format!(
                    "Duplicate macro placeholder: {}",
                    name
                )));
            }
        }

        if let Some(path) = &settings.keyword_table {
            if path.as_os_str().is_empty() {
                return Err(CompletionError::ConfigError(
                    "Keyword table path cannot be empty".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Validate a keyword table
    pub fn validate_table(table: &KeywordTable) -> CompletionResult<()> {
        let mut seen = HashSet::new();
        for entry in &table.keywords {
            if entry.text.trim().is_empty() {
                return Err(CompletionError::InvalidTable(
                    "Keyword text cannot be empty".to_string(),
                ));
            }
            if !seen.insert(entry.text.as_str()) {
                return Err(CompletionError::InvalidTable(format!(
                    "Duplicate keyword: {}",
                    entry.text
                )));
            }
        }
        Ok(())
    }

    /// Validate, then anchor a relative table path at the settings file
    fn finish(mut settings: CompletionSettings, path: &Path) -> CompletionResult<CompletionSettings> {
        Self::validate_settings(&settings)?;
        if let (Some(table), Some(dir)) = (settings.keyword_table.as_mut(), path.parent()) {
            if table.is_relative() {
                *table = dir.join(&*table);
            }
        }
        Ok(settings)
    }
}

/// Configuration format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "yaml" | "yml" => Some(ConfigFormat::Yaml),
            "json" => Some(ConfigFormat::Json),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::KeywordEntry;
    use crate::types::Tier;

    #[test]
    fn test_default_settings() {
        let settings = CompletionSettings::default();
        assert!(!settings.case_sensitive("text/x-c++"));
        assert_eq!(settings.macro_placeholders, vec!["__VA_ARGS__", "__VA_OPT__"]);
        assert!(settings.variant.is_none());
    }

    #[test]
    fn test_case_sensitivity_per_content_type() {
        let settings = CompletionSettings::default().with_case_sensitivity("text/x-c", true);
        assert!(settings.case_sensitive("text/x-c"));
        assert!(!settings.case_sensitive("text/x-c++"));
    }

    #[test]
    fn test_load_settings_from_yaml_string() {
        let yaml = "case_sensitive: true\nvariant: c\ncase_sensitivity:\n  text/x-c++: false\n";
        let settings = ConfigLoader::load_from_string(yaml, ConfigFormat::Yaml).unwrap();
        assert_eq!(settings.variant, Some(LanguageVariant::C));
        assert!(settings.case_sensitive("text/x-c"));
        assert!(!settings.case_sensitive("text/x-c++"));
        assert_eq!(settings.macro_placeholders.len(), 2);
    }

    #[test]
    fn test_load_settings_from_json_string() {
        let json = r#"{"macro_placeholders": ["__VA_ARGS__"]}"#;
        let settings = ConfigLoader::load_from_string(json, ConfigFormat::Json).unwrap();
        assert_eq!(settings.macro_placeholders, vec!["__VA_ARGS__"]);
    }

    #[test]
    fn test_validate_rejects_empty_placeholder() {
        let settings = CompletionSettings {
            macro_placeholders: vec!["".to_string()],
            ..CompletionSettings::default()
        };
        assert!(ConfigLoader::validate_settings(&settings).is_err());
    }

    #[test]
    fn test_validate_table_rejects_duplicates_and_empty_text() {
        let duplicate = KeywordTable::new(vec![
            KeywordEntry::new("return", Tier::First),
            KeywordEntry::new("return", Tier::All),
        ]);
        assert!(matches!(
            ConfigLoader::validate_table(&duplicate),
            Err(CompletionError::InvalidTable(_))
        ));

        let empty = KeywordTable::new(vec![KeywordEntry::new(" ", Tier::All)]);
        assert!(ConfigLoader::validate_table(&empty).is_err());
    }

    #[test]
    fn test_load_table_from_yaml_string() {
        let yaml = "keywords:\n  - text: return\n    tier: first\n  - text: static_cast\n";
        let table = ConfigLoader::load_table_from_string(yaml, ConfigFormat::Yaml).unwrap();
        assert_eq!(table.keywords.len(), 2);
        assert_eq!(table.keywords[0].tier, Tier::First);
        assert_eq!(table.keywords[1].tier, Tier::All);
    }

    #[test]
    fn test_malformed_yaml_is_a_yaml_error() {
        let result = ConfigLoader::load_from_string("case_sensitive: [", ConfigFormat::Yaml);
        assert!(matches!(result, Err(CompletionError::YamlError(_))));
    }

    #[test]
    fn test_missing_directory_is_a_config_error() {
        let result = ConfigLoader::load_from_directory(Path::new("/nonexistent/cppcomplete"));
        assert!(matches!(result, Err(CompletionError::ConfigError(_))));
    }

    #[test]
    fn test_builtin_table_when_no_path() {
        let table = CompletionSettings::default().load_keyword_table().unwrap();
        assert!(table.keywords.iter().any(|entry| entry.text == "return"));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ConfigFormat::from_path(Path::new("a.yml")), Some(ConfigFormat::Yaml));
        assert_eq!(ConfigFormat::from_path(Path::new("a.json")), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_path(Path::new("a.toml")), None);
    }
}
