use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use engine_logging::{engine_info, engine_warn};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use tubefetch_engine::{
    write_atomic, AudioFormat, DispatchRequest, DispatchSettings, JobPaths, JobSpec, PoolSettings,
    DEFAULT_FETCH_CONCURRENCY, DEFAULT_POLL_INTERVAL, DEFAULT_RESOLVE_CONCURRENCY,
};

use super::args::Args;

pub(crate) const SETTINGS_FILENAME: &str = "tubefetch.ron";
const LOG_FILENAME: &str = "tubefetch.log";

/// Values read from the RON settings file; anything missing takes its default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct FileSettings {
    pub dest: Option<PathBuf>,
    pub format: AudioFormat,
    pub resolve_workers: usize,
    pub fetch_workers: usize,
    pub poll_interval_ms: u64,
    pub host_token: String,
    pub log_file: PathBuf,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            dest: None,
            format: AudioFormat::default(),
            resolve_workers: DEFAULT_RESOLVE_CONCURRENCY,
            fetch_workers: DEFAULT_FETCH_CONCURRENCY,
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            host_token: DispatchSettings::default().host_token,
            log_file: PathBuf::from(LOG_FILENAME),
        }
    }
}

/// Everything one run needs, after layering CLI over file over defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RunConfig {
    pub input: PathBuf,
    pub paths: JobPaths,
    pub request: DispatchRequest,
    pub dispatch: DispatchSettings,
    pub log_file: PathBuf,
    pub level: LevelFilter,
    /// Settings as they should be saved back, without per-run flags.
    pub effective: FileSettings,
}

impl RunConfig {
    pub fn job(&self) -> JobSpec {
        JobSpec {
            input: self.input.clone(),
            paths: self.paths.clone(),
            request: self.request,
        }
    }
}

/// Settings file to use: the explicit path, else `./tubefetch.ron`.
pub(crate) fn settings_path(args: &Args, cwd: &Path) -> PathBuf {
    args.settings
        .clone()
        .unwrap_or_else(|| cwd.join(SETTINGS_FILENAME))
}

/// Load settings from `path`.
///
/// A missing default file means defaults; a missing explicit file or a file
/// that does not parse is an error.
pub(crate) fn load(path: &Path, explicit: bool) -> anyhow::Result<FileSettings> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound && !explicit => {
            return Ok(FileSettings::default());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("reading settings {}", path.display()));
        }
    };
    let settings: FileSettings = ron::from_str(&content)
        .with_context(|| format!("parsing settings {}", path.display()))?;
    engine_info!("Loaded settings from {:?}", path);
    Ok(settings)
}

pub(crate) fn save(path: &Path, settings: &FileSettings) -> anyhow::Result<()> {
    let pretty = ron::ser::PrettyConfig::new();
    let content = ron::ser::to_string_pretty(settings, pretty).context("serializing settings")?;
    write_atomic(path, content.as_bytes())
        .with_context(|| format!("writing settings {}", path.display()))?;
    engine_info!("Saved settings to {:?}", path);
    Ok(())
}

/// Combine CLI arguments over file settings; relative paths resolve against `cwd`.
pub(crate) fn layer(args: &Args, file: FileSettings, cwd: &Path) -> anyhow::Result<RunConfig> {
    if args.input.as_os_str().is_empty() {
        bail!("Input table path must not be empty");
    }
    let effective = FileSettings {
        dest: args.dest.clone().or(file.dest),
        format: args.format.unwrap_or(file.format),
        resolve_workers: args.resolve_workers.unwrap_or(file.resolve_workers),
        fetch_workers: args.fetch_workers.unwrap_or(file.fetch_workers),
        ..file
    };
    if effective.resolve_workers == 0 || effective.fetch_workers == 0 {
        engine_warn!("worker count of 0 requested; running with 1");
    }

    let input = cwd.join(&args.input);
    let dest_dir = effective
        .dest
        .as_deref()
        .map(|dest| cwd.join(dest))
        .unwrap_or_else(|| cwd.to_path_buf());
    let poll_interval = Duration::from_millis(effective.poll_interval_ms.max(1));
    let pool = |concurrency| PoolSettings {
        concurrency,
        poll_interval,
    };

    Ok(RunConfig {
        paths: JobPaths::for_input(&input, &dest_dir),
        input,
        request: DispatchRequest {
            format: effective.format,
            fetch_media: !args.links_only,
        },
        dispatch: DispatchSettings {
            resolve: pool(effective.resolve_workers),
            fetch: pool(effective.fetch_workers),
            host_token: effective.host_token.clone(),
        },
        log_file: cwd.join(&effective.log_file),
        level: if args.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        },
        effective,
    })
}
