//! Metadata resolution options
//!
//! Handles parsing of `.odata-metadata.toml` configuration files and
//! environment variable overrides. Conventions and decorators that need code
//! (closures, trait objects) can only be added programmatically.

use crate::annotations::AnnotationDecorator;
use crate::inference::ForeignKeyConvention;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Default configuration filename
pub const CONFIG_FILENAME: &str = ".odata-metadata.toml";

/// Environment variable for `allow_many_to_many`
pub const ENV_ALLOW_MANY_TO_MANY: &str = "ODATA_METADATA_ALLOW_MANY_TO_MANY";

/// Environment variable for `infer_navigation_property_partner`
pub const ENV_INFER_PARTNERS: &str = "ODATA_METADATA_INFER_PARTNERS";

/// Environment variable for `infer_referential_constraints`
pub const ENV_INFER_CONSTRAINTS: &str = "ODATA_METADATA_INFER_CONSTRAINTS";

/// Environment variable for `constraint_resolution`
pub const ENV_CONSTRAINT_RESOLUTION: &str = "ODATA_METADATA_CONSTRAINT_RESOLUTION";

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Config parse error: {0}")]
    ParseError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Which fallback a referential constraint tries first when none is declared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintResolution {
    /// Foreign-key naming conventions, then the shared-key pattern (default)
    #[default]
    ConventionsFirst,
    /// Shared-key pattern, then foreign-key naming conventions
    SharedKeyFirst,
}

impl std::str::FromStr for ConstraintResolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "conventions_first" | "conventions" => Ok(Self::ConventionsFirst),
            "shared_key_first" | "shared_key" => Ok(Self::SharedKeyFirst),
            _ => Err(format!(
                "Unknown constraint resolution: {}. Use 'conventions_first' or 'shared_key_first'.",
                s
            )),
        }
    }
}

impl fmt::Display for ConstraintResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConventionsFirst => write!(f, "conventions_first"),
            Self::SharedKeyFirst => write!(f, "shared_key_first"),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Options consumed by relationship inference and annotation dispatch
///
/// # Example
///
/// ```rust
/// use odata_metadata_sdk::config::MetadataOptions;
///
/// let options = MetadataOptions::parse("allow_many_to_many = true").unwrap();
/// assert!(options.allow_many_to_many);
/// assert!(options.infer_navigation_property_partner);
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct MetadataOptions {
    /// Permit associations whose two ends are both collections
    #[serde(default)]
    pub allow_many_to_many: bool,

    /// Synthesize an unmapped partner endpoint for one-sided navigation properties
    #[serde(default = "default_true")]
    pub infer_navigation_property_partner: bool,

    /// Fall back to the shared-key pattern when no foreign-key convention matches
    #[serde(default = "default_true")]
    pub infer_referential_constraints: bool,

    #[serde(default)]
    pub constraint_resolution: ConstraintResolution,

    /// Foreign-key name patterns using `{property}`, `{partner}` and `{key}`
    #[serde(default)]
    pub foreign_key_patterns: Vec<String>,

    /// Conventions tried before the patterns and the built-ins
    #[serde(skip)]
    pub foreign_key_conventions: Vec<ForeignKeyConvention>,

    /// Decorators appended after the built-in ones
    #[serde(skip)]
    pub annotation_decorators: Vec<Arc<dyn AnnotationDecorator>>,
}

impl Default for MetadataOptions {
    fn default() -> Self {
        Self {
            allow_many_to_many: false,
            infer_navigation_property_partner: true,
            infer_referential_constraints: true,
            constraint_resolution: ConstraintResolution::default(),
            foreign_key_patterns: Vec::new(),
            foreign_key_conventions: Vec::new(),
            annotation_decorators: Vec::new(),
        }
    }
}

impl fmt::Debug for MetadataOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let decorators: Vec<&str> = self.annotation_decorators.iter().map(|d| d.name()).collect();
        f.debug_struct("MetadataOptions")
            .field("allow_many_to_many", &self.allow_many_to_many)
            .field(
                "infer_navigation_property_partner",
                &self.infer_navigation_property_partner,
            )
            .field(
                "infer_referential_constraints",
                &self.infer_referential_constraints,
            )
            .field("constraint_resolution", &self.constraint_resolution)
            .field("foreign_key_patterns", &self.foreign_key_patterns)
            .field("foreign_key_conventions", &self.foreign_key_conventions)
            .field("annotation_decorators", &decorators)
            .finish()
    }
}

impl MetadataOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_foreign_key_convention(mut self, convention: ForeignKeyConvention) -> Self {
        self.foreign_key_conventions.push(convention);
        self
    }

    pub fn with_decorator(mut self, decorator: Arc<dyn AnnotationDecorator>) -> Self {
        self.annotation_decorators.push(decorator);
        self
    }

    /// User conventions first, then configured patterns, then the built-ins.
    pub fn effective_conventions(&self) -> Vec<ForeignKeyConvention> {
        self.foreign_key_conventions
            .iter()
            .cloned()
            .chain(
                self.foreign_key_patterns
                    .iter()
                    .map(|p| ForeignKeyConvention::Pattern(p.clone())),
            )
            .chain(ForeignKeyConvention::built_ins())
            .collect()
    }

    /// Load options from a directory
    ///
    /// Looks for `.odata-metadata.toml` in `dir` and falls back to defaults
    /// if it is missing. Environment overrides are applied either way.
    pub fn load(dir: &Path) -> ConfigResult<Self> {
        let config_path = dir.join(CONFIG_FILENAME);

        let mut options = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::IoError(format!("Failed to read config: {}", e)))?;
            Self::parse(&content)?
        } else {
            Self::default()
        };

        options.apply_env_overrides();
        Ok(options)
    }

    /// Parse options from a TOML string
    pub fn parse(content: &str) -> ConfigResult<Self> {
        toml::from_str(content)
            .map_err(|e| ConfigError::ParseError(format!("Failed to parse config: {}", e)))
    }

    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        serde_json::from_str(content)
            .map_err(|e| ConfigError::ParseError(format!("Failed to parse JSON config: {}", e)))
    }

    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| ConfigError::ParseError(format!("Failed to parse YAML config: {}", e)))
    }

    /// Save options to a directory
    pub fn save(&self, dir: &Path) -> ConfigResult<()> {
        let content = self.to_toml()?;
        std::fs::write(dir.join(CONFIG_FILENAME), content)
            .map_err(|e| ConfigError::IoError(format!("Failed to write config: {}", e)))
    }

    pub fn to_toml(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|e| {
            ConfigError::SerializationError(format!("Failed to serialize config: {}", e))
        })
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Some(value) = env_bool(ENV_ALLOW_MANY_TO_MANY) {
            self.allow_many_to_many = value;
        }
        if let Some(value) = env_bool(ENV_INFER_PARTNERS) {
            self.infer_navigation_property_partner = value;
        }
        if let Some(value) = env_bool(ENV_INFER_CONSTRAINTS) {
            self.infer_referential_constraints = value;
        }
        if let Ok(value) = std::env::var(ENV_CONSTRAINT_RESOLUTION)
            && let Ok(resolution) = value.parse()
        {
            self.constraint_resolution = resolution;
        }
    }

    /// Check if a configuration file exists in `dir`
    pub fn exists(dir: &Path) -> bool {
        dir.join(CONFIG_FILENAME).exists()
    }
}

fn env_bool(name: &str) -> Option<bool> {
    let value = std::env::var(name).ok()?;
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Generate a sample configuration file content
pub fn sample_config() -> &'static str {
    r#"# OData metadata resolution options

# Allow associations whose ends are both collections
allow_many_to_many = false

# Synthesize the missing side of one-directional navigation properties
infer_navigation_property_partner = true

# Fall back to the shared-key pattern for referential constraints
infer_referential_constraints = true

# "conventions_first" (default) or "shared_key_first"
constraint_resolution = "conventions_first"

# Extra foreign-key name patterns, tried before the built-ins
# Placeholders: {property}, {partner}, {key}
foreign_key_patterns = ["{property}_{key}"]
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_options() {
        let options = MetadataOptions::new();
        assert!(!options.allow_many_to_many);
        assert!(options.infer_navigation_property_partner);
        assert!(options.infer_referential_constraints);
        assert_eq!(
            options.constraint_resolution,
            ConstraintResolution::ConventionsFirst
        );
    }

    #[test]
    fn test_parse_options() {
        let toml = r#"
allow_many_to_many = true
infer_referential_constraints = false
constraint_resolution = "shared_key_first"
foreign_key_patterns = ["{partner}_{key}"]
"#;
        let options = MetadataOptions::parse(toml).unwrap();
        assert!(options.allow_many_to_many);
        assert!(options.infer_navigation_property_partner);
        assert!(!options.infer_referential_constraints);
        assert_eq!(
            options.constraint_resolution,
            ConstraintResolution::SharedKeyFirst
        );
        assert_eq!(options.foreign_key_patterns, vec!["{partner}_{key}"]);
    }

    #[test]
    fn test_parse_json_and_yaml() {
        let json = MetadataOptions::from_json_str(r#"{"allow_many_to_many": true}"#).unwrap();
        assert!(json.allow_many_to_many);

        let yaml = MetadataOptions::from_yaml_str("infer_navigation_property_partner: false\n")
            .unwrap();
        assert!(!yaml.infer_navigation_property_partner);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let result = MetadataOptions::parse("allow_many_to_many = \"maybe\"");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let options = MetadataOptions {
            foreign_key_patterns: vec!["{property}Key".to_string()],
            ..Default::default()
        };

        options.save(dir.path()).unwrap();
        assert!(MetadataOptions::exists(dir.path()));

        let loaded = MetadataOptions::load(dir.path()).unwrap();
        assert_eq!(loaded.foreign_key_patterns, vec!["{property}Key"]);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let loaded = MetadataOptions::load(dir.path()).unwrap();
        assert!(loaded.foreign_key_patterns.is_empty());
    }

    #[test]
    fn test_constraint_resolution_from_str() {
        assert_eq!(
            "shared-key-first".parse::<ConstraintResolution>().unwrap(),
            ConstraintResolution::SharedKeyFirst
        );
        assert_eq!(
            "conventions".parse::<ConstraintResolution>().unwrap(),
            ConstraintResolution::ConventionsFirst
        );
        assert!("random".parse::<ConstraintResolution>().is_err());
    }

    #[test]
    fn test_sample_config_is_valid() {
        let options = MetadataOptions::parse(sample_config()).unwrap();
        assert_eq!(options.foreign_key_patterns, vec!["{property}_{key}"]);
    }

    #[test]
    fn test_effective_conventions_order() {
        let options = MetadataOptions {
            foreign_key_patterns: vec!["{key}".to_string()],
            ..Default::default()
        }
        .with_foreign_key_convention(ForeignKeyConvention::Pattern("{property}Ref".to_string()));
        let conventions = options.effective_conventions();
        assert!(matches!(
            &conventions[0],
            ForeignKeyConvention::Pattern(p) if p == "{property}Ref"
        ));
        assert!(matches!(&conventions[1], ForeignKeyConvention::Pattern(p) if p == "{key}"));
        assert!(matches!(conventions[2], ForeignKeyConvention::PropertyName));
        assert!(matches!(conventions[3], ForeignKeyConvention::PartnerEntityName));
    }
}
