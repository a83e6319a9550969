//! Where the config files live. Lookups only; a missing directory is not created.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;

const CONFIG_PREFIX: &str = "escaperoom";
const FALLBACK_CONFIG_PATH: &str = "/tmp/escaperoom";

pub static CONFIG_ROOT_PATH: Lazy<PathBuf> = Lazy::new(|| {
    match xdg::BaseDirectories::with_prefix(CONFIG_PREFIX) {
        Ok(dirs) => dirs.get_config_home(),
        Err(e) => {
            log::error!(
                "No XDG config home ({}), using {}",
                e,
                FALLBACK_CONFIG_PATH
            );
            PathBuf::from(FALLBACK_CONFIG_PATH)
        }
    }
});

/// `config.yaml` under `root`, if present.
pub fn base_config_file(root: &Path) -> Option<PathBuf> {
    let path = root.join("config.yaml");
    path.is_file().then_some(path)
}

/// Files in `root/conf.d`, sorted so later names override earlier ones.
pub fn conf_d_files(root: &Path) -> Vec<PathBuf> {
    let conf_d = root.join("conf.d");
    let entries = match std::fs::read_dir(&conf_d) {
        Ok(entries) => entries,
        Err(e) => {
            log::debug!("No conf.d at {}: {}", conf_d.to_string_lossy(), e);
            return Vec::new();
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|r| match r {
            Ok(entry) => Some(entry.path()),
            Err(e) => {
                log::error!("Failed to read conf.d entry: {}", e);
                None
            }
        })
        .filter(|p| p.is_file())
        .collect();
    paths.sort();
    paths
}
