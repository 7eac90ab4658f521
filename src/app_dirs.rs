use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "keytrial";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// `$HOME/.local/state/keytrial`, or the platform data dir when HOME is unset
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join(APP_NAME),
            )
        } else {
            ProjectDirs::from("", "", APP_NAME).map(|pd| pd.data_local_dir().to_path_buf())
        }
    }

    /// File holding the JSON array of attempt records
    pub fn history_path() -> PathBuf {
        Self::state_dir()
            .map(|dir| dir.join("history.json"))
            .unwrap_or_else(|| PathBuf::from("keytrial_history.json"))
    }

    pub fn log_path() -> PathBuf {
        Self::state_dir()
            .map(|dir| dir.join("keytrial.log"))
            .unwrap_or_else(|| PathBuf::from("keytrial.log"))
    }

    pub fn config_path() -> PathBuf {
        ProjectDirs::from("", "", APP_NAME)
            .map(|pd| pd.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("keytrial_config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_use_expected_file_names() {
        assert!(AppDirs::history_path().ends_with("history.json")
            || AppDirs::history_path().ends_with("keytrial_history.json"));
        assert!(AppDirs::log_path()
            .to_string_lossy()
            .ends_with("keytrial.log"));
        assert!(AppDirs::config_path()
            .to_string_lossy()
            .ends_with("config.json"));
    }
}
