use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use engine_logging::engine_debug;
use serde::Deserialize;
use tokio::process::Command;

use crate::variants::query_variants;
use crate::{AudioFormat, CapabilityError, Fetcher, Resolver};

const TOOL: &str = "yt-dlp";
const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    entries: Vec<SearchEntry>,
}

#[derive(Debug, Deserialize)]
struct SearchEntry {
    id: Option<String>,
}

fn spawn_error(program: &Path, err: io::Error) -> CapabilityError {
    if err.kind() == io::ErrorKind::NotFound {
        CapabilityError::Unavailable(program.display().to_string())
    } else {
        CapabilityError::Io(err)
    }
}

/// Id of the first search hit in `yt-dlp --dump-single-json` output.
fn first_entry_id(stdout: &[u8]) -> Result<Option<String>, CapabilityError> {
    let result: SearchResult =
        serde_json::from_slice(stdout).map_err(|err| CapabilityError::Process {
            tool: TOOL,
            message: format!("unreadable search output: {err}"),
        })?;
    Ok(result
        .entries
        .into_iter()
        .filter_map(|entry| entry.id)
        .find(|id| !id.trim().is_empty()))
}

/// Looks queries up with `yt-dlp` search, trying each query variant in turn.
#[derive(Debug, Clone)]
pub struct YtDlpResolver {
    program: PathBuf,
}

impl Default for YtDlpResolver {
    fn default() -> Self {
        Self::new(TOOL)
    }
}

impl YtDlpResolver {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn search(&self, variant: &str) -> Result<Option<String>, CapabilityError> {
        let output = Command::new(&self.program)
            .args(["--quiet", "--no-warnings", "--flat-playlist", "--dump-single-json"])
            .arg(format!("ytsearch1:{variant}"))
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|err| spawn_error(&self.program, err))?;

        if !output.status.success() {
            return Err(CapabilityError::Process {
                tool: TOOL,
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        first_entry_id(&output.stdout)
    }
}

#[async_trait::async_trait]
impl Resolver for YtDlpResolver {
    async fn resolve(&self, query: &str) -> Result<String, CapabilityError> {
        for variant in query_variants(query) {
            match self.search(&variant).await {
                Ok(Some(id)) => return Ok(format!("{WATCH_URL}{id}")),
                Ok(None) => engine_debug!("no hit for variant {:?}", variant),
                Err(err @ CapabilityError::Unavailable(_)) => return Err(err),
                Err(err) => engine_debug!("variant {:?} failed: {}", variant, err),
            }
        }
        Err(CapabilityError::NotFound(query.to_string()))
    }
}

/// Downloads and transcodes a link with `yt-dlp -x`.
#[derive(Debug, Clone)]
pub struct YtDlpFetcher {
    program: PathBuf,
    quality: String,
}

impl Default for YtDlpFetcher {
    fn default() -> Self {
        Self::new(TOOL)
    }
}

impl YtDlpFetcher {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            quality: "192K".to_string(),
        }
    }

    fn args(&self, link: &str, dest_dir: &Path, format: AudioFormat) -> Vec<OsString> {
        let template = dest_dir.join("%(title)s.%(ext)s");
        vec![
            "--quiet".into(),
            "--no-warnings".into(),
            "--no-playlist".into(),
            "-f".into(),
            "bestaudio/best".into(),
            "-x".into(),
            "--audio-format".into(),
            format.as_str().into(),
            "--audio-quality".into(),
            self.quality.clone().into(),
            "-o".into(),
            template.into_os_string(),
            link.into(),
        ]
    }
}

#[async_trait::async_trait]
impl Fetcher for YtDlpFetcher {
    async fn fetch(
        &self,
        link: &str,
        dest_dir: &Path,
        format: AudioFormat,
    ) -> Result<(), CapabilityError> {
        let output = Command::new(&self.program)
            .args(self.args(link, dest_dir, format))
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|err| spawn_error(&self.program, err))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = stderr
                .lines()
                .rev()
                .find(|line| !line.trim().is_empty())
                .map(|line| line.trim().to_string())
                .unwrap_or_else(|| format!("exited with {}", output.status));
            return Err(CapabilityError::Process { tool: TOOL, message });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_entry_id_picks_first_non_empty_hit() {
        let json = br#"{"_type":"playlist","entries":[{"id":""},{"id":"abc123","title":"x"}]}"#;
        assert_eq!(first_entry_id(json).unwrap(), Some("abc123".to_string()));
    }

    #[test]
    fn first_entry_id_handles_missing_entries() {
        assert_eq!(first_entry_id(br#"{"_type":"playlist"}"#).unwrap(), None);
        assert!(first_entry_id(b"not json").is_err());
    }

    #[test]
    fn fetch_args_place_template_in_destination_and_link_last() {
        let fetcher = YtDlpFetcher::default();
        let args = fetcher.args(
            "https://www.youtube.com/watch?v=abc",
            Path::new("/music"),
            AudioFormat::Flac,
        );
        let args: Vec<String> = args
            .into_iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();

        let format_at = args.iter().position(|a| a == "--audio-format").unwrap();
        assert_eq!(args[format_at + 1], "flac");
        let output_at = args.iter().position(|a| a == "-o").unwrap();
        assert_eq!(
            PathBuf::from(&args[output_at + 1]),
            Path::new("/music").join("%(title)s.%(ext)s")
        );
        assert_eq!(args.last().unwrap(), "https://www.youtube.com/watch?v=abc");
    }

    #[tokio::test]
    async fn missing_tool_is_reported_as_unavailable() {
        let resolver = YtDlpResolver::new("/nonexistent/tubefetch-yt-dlp");
        let err = resolver.resolve("A - X").await.unwrap_err();
        assert!(matches!(err, CapabilityError::Unavailable(_)));
    }
}
