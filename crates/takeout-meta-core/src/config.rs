use config::{Config, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::matcher::{SidecarSuffixSet, DEFAULT_SIDECAR_SUFFIXES};

/// Sidecar names at or near this many characters (before `.json`) are
/// treated as possibly cut short by the exporter.
pub const DEFAULT_TRUNCATION_BUDGET: usize = 47;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub root_paths: Vec<String>,
    pub ignore_patterns: Vec<String>,
    pub recursive: bool,
    pub sidecar_suffixes: Vec<String>,
    pub truncation_budget: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            root_paths: Vec::new(),
            ignore_patterns: Vec::new(),
            recursive: true,
            sidecar_suffixes: DEFAULT_SIDECAR_SUFFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            truncation_budget: DEFAULT_TRUNCATION_BUDGET,
        }
    }
}

impl AppConfig {
    /// Validated suffix set built from `sidecar_suffixes`.
    pub fn suffix_set(&self) -> Result<SidecarSuffixSet> {
        SidecarSuffixSet::new(self.sidecar_suffixes.iter().cloned())
    }
}

/// Load `Config.toml` (optional) overlaid with `TAKEOUT_META_*` environment
/// variables. List values in the environment are comma separated.
pub fn load_configuration() -> Result<AppConfig> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(
            Environment::with_prefix("TAKEOUT_META")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("root_paths")
                .with_list_parse_key("ignore_patterns")
                .with_list_parse_key("sidecar_suffixes"),
        )
        .build()?;
    Ok(builder.try_deserialize::<AppConfig>()?)
}

/// Remove directories that are subdirectories of other directories in the list.
pub fn non_overlapping_directories(dirs: Vec<String>) -> Vec<String> {
    let mut result: Vec<String> = Vec::new();

    for dir in dirs {
        let dir_path = Path::new(&dir);

        if result
            .iter()
            .any(|res_dir| dir_path.starts_with(Path::new(res_dir)))
        {
            continue;
        }

        result.retain(|res_dir| !Path::new(res_dir).starts_with(dir_path));
        result.push(dir);
    }

    result
}
