//! Fatal errors. Anything recoverable (template lookup, fact probes) never
//! ends up here, it gets masked by a fallback instead.

use std::num::ParseIntError;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Config file not found, searched: {}", join_paths(.searched))]
    ConfigNotFound { searched: Vec<PathBuf> },

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Fetch script path is empty")]
    EmptyFetchScript,

    #[error("Fetch script file not found: {}", .0.display())]
    FetchScriptNotFound(PathBuf),

    #[error("Fetch script path points to a directory: {}", .0.display())]
    FetchScriptIsDir(PathBuf),

    #[error("Malformed color directive segment {segment:?}: {source}")]
    Directive {
        segment: String,
        #[source]
        source: ParseIntError,
    },

    #[error("Could not run fetch script {}: {source}", .path.display())]
    ScriptSpawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Fetch script {} failed ({status}): {stderr}", .path.display())]
    ScriptFailed {
        path: PathBuf,
        status: ExitStatus,
        stderr: String,
    },
}

pub type Result<T> = std::result::Result<T, FetchError>;

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
