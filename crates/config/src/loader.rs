use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{env_subst::substitute_env, schema::KryptaConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["krypta.toml", "krypta.yaml", "krypta.yml", "krypta.json"];

/// Default SQLite file name inside the data directory.
const DATABASE_FILENAME: &str = "krypta.db";

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<KryptaConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./krypta.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/krypta/krypta.{toml,yaml,yml,json}` (user-global)
///
/// Returns `KryptaConfig::default()` if no config file is found.
pub fn discover_and_load() -> KryptaConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    KryptaConfig::default()
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    let local = CONFIG_FILENAMES.iter().map(PathBuf::from);
    let global = config_dir()
        .into_iter()
        .flat_map(|dir| CONFIG_FILENAMES.iter().map(move |name| dir.join(name)));

    local.chain(global).find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/krypta/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "krypta").map(|d| d.config_dir().to_path_buf())
}

/// Returns the user-global data directory.
pub fn data_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "krypta").map(|d| d.data_dir().to_path_buf())
}

/// Resolve the SQLite path: the configured one, else `<data dir>/krypta.db`,
/// else `./krypta.db`.
pub fn database_path(config: &KryptaConfig) -> PathBuf {
    if let Some(path) = &config.storage.database {
        return path.clone();
    }
    data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DATABASE_FILENAME)
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<KryptaConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}
