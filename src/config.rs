use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{FetchError, Result};

pub const SYSTEM_CONFIG_DIR: &str = "/etc/stormfetch";
const CONFIG_FILE: &str = "config.toml";
const FETCH_SCRIPT_FILE: &str = "fetch_script.sh";

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Art id, or "auto" for whatever the distro id is.
    pub distro_ascii: String,
    pub distro_name: String,
    /// Path to the fetch script, or "auto" to look in the config dirs.
    pub fetch_script: String,
    pub ansii_colors: Vec<u8>,
    pub force_config_ansii: bool,
    pub show_fs_type: bool,
    pub hidden_partitions: Vec<String>,
    pub hidden_filesystems: Vec<String>,
    pub hidden_gpus: Vec<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            distro_ascii: "auto".to_string(),
            distro_name: String::new(),
            fetch_script: "auto".to_string(),
            ansii_colors: Vec::new(),
            force_config_ansii: false,
            show_fs_type: false,
            hidden_partitions: Vec::new(),
            hidden_filesystems: Vec::new(),
            hidden_gpus: Vec::new(),
        }
    }
}

/// Where config, fetch script and ascii art live: user dir first, then /etc.
#[derive(Debug, Clone)]
pub struct ConfigDirs {
    dirs: Vec<PathBuf>,
}

impl ConfigDirs {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    pub fn from_system() -> Self {
        let mut found = Vec::new();
        if let Some(user) = dirs::config_dir() {
            found.push(user.join("stormfetch"));
        }
        found.push(PathBuf::from(SYSTEM_CONFIG_DIR));
        Self::new(found)
    }

    /// `name` joined onto each dir, in lookup order.
    pub fn candidates(&self, name: &str) -> Vec<PathBuf> {
        self.dirs.iter().map(|d| d.join(name)).collect()
    }

    /// First existing config.toml. Not finding one is fatal.
    pub fn find_config(&self) -> Result<PathBuf> {
        let searched = self.candidates(CONFIG_FILE);
        match searched.iter().find(|p| p.is_file()) {
            Some(path) => Ok(path.clone()),
            None => Err(FetchError::ConfigNotFound { searched }),
        }
    }

    /// Resolves `fetch_script` from the config. "auto" searches the dirs.
    pub fn find_fetch_script(&self, configured: &str) -> Result<PathBuf> {
        match configured {
            "" => Err(FetchError::EmptyFetchScript),
            "auto" => self
                .candidates(FETCH_SCRIPT_FILE)
                .into_iter()
                .find(|p| p.is_file())
                .ok_or_else(|| FetchError::FetchScriptNotFound(PathBuf::from(FETCH_SCRIPT_FILE))),
            explicit => {
                let path = PathBuf::from(explicit);
                let meta = fs::metadata(&path).map_err(|_| FetchError::FetchScriptNotFound(path.clone()))?;
                if meta.is_dir() {
                    return Err(FetchError::FetchScriptIsDir(path));
                }
                Ok(path)
            }
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| FetchError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&content).map_err(|source| FetchError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// `--ascii` and `--distro-name` win over the file.
    pub fn with_overrides(mut self, ascii: Option<String>, distro_name: Option<String>) -> Self {
        if let Some(ascii) = ascii {
            self.distro_ascii = ascii;
        }
        if let Some(name) = distro_name {
            self.distro_name = name;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn empty_file_is_all_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.distro_ascii, "auto");
        assert_eq!(config.fetch_script, "auto");
    }

    #[test]
    fn parses_every_key() {
        let config: Config = toml::from_str(
            r#"
            distro_ascii = "arch"
            distro_name = "My Arch"
            fetch_script = "/opt/fetch.sh"
            ansii_colors = [33, 7]
            force_config_ansii = true
            show_fs_type = true
            hidden_partitions = ["/dev/sda1", "/boot"]
            hidden_filesystems = ["vfat"]
            hidden_gpus = [2]
            "#,
        )
        .unwrap();
        assert_eq!(config.distro_ascii, "arch");
        assert_eq!(config.ansii_colors, vec![33, 7]);
        assert!(config.force_config_ansii);
        assert_eq!(config.hidden_partitions, vec!["/dev/sda1", "/boot"]);
        assert_eq!(config.hidden_gpus, vec![2]);
    }

    #[test]
    fn out_of_range_color_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "ansii_colors = [300]").unwrap();
        assert!(matches!(
            Config::from_file(&path),
            Err(FetchError::ConfigParse { .. })
        ));
    }

    #[test]
    fn user_config_shadows_system_config() {
        let user = TempDir::new().unwrap();
        let system = TempDir::new().unwrap();
        fs::write(system.path().join("config.toml"), "").unwrap();

        let dirs = ConfigDirs::new(vec![user.path().into(), system.path().into()]);
        assert_eq!(dirs.find_config().unwrap(), system.path().join("config.toml"));

        fs::write(user.path().join("config.toml"), "").unwrap();
        assert_eq!(dirs.find_config().unwrap(), user.path().join("config.toml"));
    }

    #[test]
    fn missing_config_is_fatal() {
        let empty = TempDir::new().unwrap();
        let dirs = ConfigDirs::new(vec![empty.path().into()]);
        match dirs.find_config() {
            Err(FetchError::ConfigNotFound { searched }) => {
                assert_eq!(searched, vec![empty.path().join("config.toml")]);
            }
            other => panic!("expected ConfigNotFound, got {other:?}"),
        }
    }

    #[test]
    fn fetch_script_resolution() {
        let user = TempDir::new().unwrap();
        let dirs = ConfigDirs::new(vec![user.path().into()]);

        assert!(matches!(dirs.find_fetch_script(""), Err(FetchError::EmptyFetchScript)));
        assert!(matches!(
            dirs.find_fetch_script("auto"),
            Err(FetchError::FetchScriptNotFound(_))
        ));

        let script = user.path().join("fetch_script.sh");
        fs::write(&script, "echo hi").unwrap();
        assert_eq!(dirs.find_fetch_script("auto").unwrap(), script);

        let explicit = user.path().join("other.sh");
        assert!(matches!(
            dirs.find_fetch_script(explicit.to_str().unwrap()),
            Err(FetchError::FetchScriptNotFound(_))
        ));
        fs::write(&explicit, "echo other").unwrap();
        assert_eq!(dirs.find_fetch_script(explicit.to_str().unwrap()).unwrap(), explicit);

        assert!(matches!(
            dirs.find_fetch_script(user.path().to_str().unwrap()),
            Err(FetchError::FetchScriptIsDir(_))
        ));
    }

    #[test]
    fn cli_overrides() {
        let config = Config::default().with_overrides(Some("debian".into()), None);
        assert_eq!(config.distro_ascii, "debian");
        assert_eq!(config.distro_name, "");
    }
}
