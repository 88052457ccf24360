use std::fs;
use std::path::PathBuf;

use include_dir::{Dir, include_dir};
use tracing::{debug, warn};

use crate::config::ConfigDirs;

static LOGOS_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/logos");

/// Tux, for when nothing matches the distro.
pub const DEFAULT_ASCII: &str = r"    .--.
   |o_o |
   |:_/ |
  //   \ \
 (|     | )
/'\_   _/'\
\___)=(___/ ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    File(PathBuf),
    Bundled(String),
    Default,
}

#[derive(Debug, Clone)]
pub struct Template {
    pub source: TemplateSource,
    pub raw: String,
}

impl Template {
    fn default_art() -> Self {
        Self {
            source: TemplateSource::Default,
            raw: DEFAULT_ASCII.to_string(),
        }
    }
}

/// Finds the ascii art for a distro id. Directories are tried in order, then
/// the logos compiled into the binary, then Tux. Lookup never fails.
#[derive(Debug, Clone)]
pub struct TemplateLoader {
    search_dirs: Vec<PathBuf>,
    bundled: bool,
}

impl TemplateLoader {
    pub fn new(search_dirs: Vec<PathBuf>) -> Self {
        Self {
            search_dirs,
            bundled: true,
        }
    }

    /// `ascii/` under each config dir, user before system.
    pub fn from_config_dirs(dirs: &ConfigDirs) -> Self {
        Self::new(dirs.candidates("ascii"))
    }

    #[cfg(test)]
    pub fn without_bundled(mut self) -> Self {
        self.bundled = false;
        self
    }

    pub fn load(&self, id: &str) -> Template {
        if !is_plain_name(id) {
            warn!(id, "ascii id is not a plain name, using default art");
            return Template::default_art();
        }

        for dir in &self.search_dirs {
            let path = dir.join(id);
            match fs::read_to_string(&path) {
                Ok(raw) => {
                    debug!(path = %path.display(), "loaded ascii art");
                    return Template {
                        source: TemplateSource::File(path),
                        raw: trim_art(&raw).to_string(),
                    };
                }
                Err(e) => debug!(path = %path.display(), error = %e, "ascii art candidate skipped"),
            }
        }

        if self.bundled {
            if let Some(raw) = LOGOS_DIR.get_file(id).and_then(|f| f.contents_utf8()) {
                debug!(id, "using bundled ascii art");
                return Template {
                    source: TemplateSource::Bundled(id.to_string()),
                    raw: trim_art(raw).to_string(),
                };
            }
        }

        debug!(id, "no ascii art found, using default");
        Template::default_art()
    }
}

/// Names of the logos compiled into the binary.
#[cfg(test)]
pub fn bundled_ids() -> Vec<&'static str> {
    let mut ids: Vec<_> = LOGOS_DIR
        .files()
        .filter_map(|f| f.path().file_name()?.to_str())
        .collect();
    ids.sort_unstable();
    ids
}

fn is_plain_name(id: &str) -> bool {
    !id.is_empty() && id != "." && id != ".." && !id.contains(|c: char| c == '/' || c == '\\')
}

fn trim_art(raw: &str) -> &str {
    raw.trim_end_matches(&['\n', '\t', ' '][..])
}
