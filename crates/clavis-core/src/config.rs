use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use crate::policy::{DESCRIPTION_MIN_LEN, MergePolicy};

/// Project-level settings read from `.clavis/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub merge: MergeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeConfig {
    /// Hosts treated as placeholder images on top of the built-in list.
    #[serde(default)]
    pub extra_placeholder_domains: Vec<String>,
    #[serde(default = "default_description_min_len")]
    pub description_min_len: usize,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            extra_placeholder_domains: Vec::new(),
            description_min_len: default_description_min_len(),
        }
    }
}

impl ProjectConfig {
    /// Build the merge policy these settings describe.
    #[must_use]
    pub fn merge_policy(&self) -> MergePolicy {
        MergePolicy {
            description_min_len: self.merge.description_min_len,
            ..MergePolicy::default()
        }
        .with_extra_placeholders(self.merge.extra_placeholder_domains.iter())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub project: ProjectConfig,
    pub user: UserConfig,
    pub resolved_output: String,
}

/// Path of the project config below `project_root`.
#[must_use]
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".clavis/config.toml")
}

pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    load_config_file(&project_config_path(project_root))
}

/// Load a project config from an explicit path. A missing file yields defaults.
pub fn load_config_file(path: &Path) -> Result<ProjectConfig> {
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    let path = config_dir.join("clavis/config.toml");
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Merge project config, user config and environment into one view.
///
/// `config_path` overrides the default `.clavis/config.toml` lookup.
pub fn resolve_config(
    project_root: &Path,
    config_path: Option<&Path>,
    cli_json: bool,
) -> Result<EffectiveConfig> {
    let project = match config_path {
        Some(path) => load_config_file(path)?,
        None => load_project_config(project_root)?,
    };
    let user = load_user_config()?;

    let env_format = env::var("FORMAT").ok();
    let resolved_output = resolve_output(cli_json, user.output.clone(), env_format);

    Ok(EffectiveConfig {
        project,
        user,
        resolved_output,
    })
}

fn resolve_output(
    cli_json: bool,
    user_output: Option<String>,
    env_format: Option<String>,
) -> String {
    fn normalize_output_mode(raw: &str) -> Option<&'static str> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" | "human" => Some("pretty"),
            "text" | "plain" => Some("text"),
            "json" => Some("json"),
            _ => None,
        }
    }

    if cli_json {
        return "json".to_string();
    }

    if let Some(mode) = env_format.as_deref().and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if let Some(mode) = user_output.as_deref().and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if std::io::stdout().is_terminal() {
        "pretty".to_string()
    } else {
        "text".to_string()
    }
}

const fn default_description_min_len() -> usize {
    DESCRIPTION_MIN_LEN
}
