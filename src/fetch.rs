//! Runs the user's fetch script. Its stdout is the text that ends up next to
//! the art, one fact per line.

use std::fs;
use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::error::{FetchError, Result};
use crate::ui::OutputBlock;

/// Runs `bash <script>` from the script's own directory with `env` added to
/// the inherited environment. Anything but a clean exit is fatal.
pub fn run_fetch_script(script: &Path, env: &[(String, String)]) -> Result<OutputBlock> {
    // absolute, since the working directory changes underneath it
    let script = fs::canonicalize(script).unwrap_or_else(|_| script.to_path_buf());
    let mut cmd = Command::new("/bin/bash");
    cmd.arg(&script).envs(env.iter().map(|(k, v)| (k, v)));
    if let Some(dir) = script.parent() {
        cmd.current_dir(dir);
    }

    debug!(script = %script.display(), vars = env.len(), "running fetch script");
    let output = cmd.output().map_err(|source| FetchError::ScriptSpawn {
        path: script.clone(),
        source,
    })?;

    if !output.status.success() {
        return Err(FetchError::ScriptFailed {
            path: script,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(OutputBlock::from_stdout(&String::from_utf8_lossy(&output.stdout)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn script(dir: &TempDir, body: &str) -> std::path::PathBuf {
        let path = dir.path().join("fetch_script.sh");
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn stdout_becomes_the_output_block() {
        let dir = TempDir::new().unwrap();
        let path = script(&dir, "echo \"Distro: $DISTRO_SHORT_NAME\"\necho \"${C1}CPU${C0}\"\n");
        let env = vec![
            ("DISTRO_SHORT_NAME".to_string(), "Arch".to_string()),
            ("C1".to_string(), "<c1>".to_string()),
            ("C0".to_string(), "<c0>".to_string()),
        ];
        let block = run_fetch_script(&path, &env).unwrap();
        assert_eq!(block.lines(), &["Distro: Arch", "<c1>CPU<c0>"]);
    }

    #[test]
    fn runs_from_the_script_directory() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("extra.txt"), "from a sibling file\n").unwrap();
        let path = script(&dir, "cat extra.txt\n");
        let block = run_fetch_script(&path, &[]).unwrap();
        assert_eq!(block.lines(), &["from a sibling file"]);
    }

    #[test]
    fn failing_script_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = script(&dir, "echo partial\necho oops >&2\nexit 3\n");
        match run_fetch_script(&path, &[]) {
            Err(FetchError::ScriptFailed { stderr, status, .. }) => {
                assert_eq!(stderr, "oops");
                assert_eq!(status.code(), Some(3));
            }
            other => panic!("expected ScriptFailed, got {other:?}"),
        }
    }
}
