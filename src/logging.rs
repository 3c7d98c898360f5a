use log::LevelFilter;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::Config;
use crate::utils::{self, Profile};

pub const LOG_FILE_NAME: &str = "tagpost.log";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Could not determine data directory for log file")]
    NoDataDir,
    #[error("Failed to open log file {path}: {source}")]
    OpenError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to install logger: {0}")]
    InstallError(#[from] log::SetLoggerError),
}

/// Map a config level name to a filter; unknown names mean `Info`
pub fn parse_level(level: &str) -> LevelFilter {
    level.trim().parse().unwrap_or(LevelFilter::Info)
}

pub fn log_file_path(profile: Profile) -> Result<PathBuf, LoggingError> {
    utils::get_data_dir(profile)
        .map(|dir| dir.join(LOG_FILE_NAME))
        .ok_or(LoggingError::NoDataDir)
}

/// Install the global logger for a profile, appending to its log file
pub fn init(config: &Config, profile: Profile) -> Result<PathBuf, LoggingError> {
    let path = log_file_path(profile)?;
    init_with_file(&path, parse_level(&config.log_level))?;
    Ok(path)
}

/// Install the global logger writing to `path`. The terminal belongs to the
/// TUI, so records never go to stdout or stderr. `RUST_LOG` overrides `level`.
pub fn init_with_file(path: &Path, level: LevelFilter) -> Result<(), LoggingError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| LoggingError::OpenError {
            path: path.to_path_buf(),
            source,
        })?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LoggingError::OpenError {
            path: path.to_path_buf(),
            source,
        })?;

    env_logger::Builder::new()
        .filter_level(level)
        .parse_env(env_logger::Env::default())
        .target(env_logger::Target::Pipe(Box::new(file)))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}: {}",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f UTC"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("debug", LevelFilter::Debug)]
    #[case(" WARN ", LevelFilter::Warn)]
    #[case("Trace", LevelFilter::Trace)]
    #[case("off", LevelFilter::Off)]
    #[case("loud", LevelFilter::Info)]
    fn level_names(#[case] name: &str, #[case] expected: LevelFilter) {
        assert_eq!(parse_level(name), expected);
    }

    #[test]
    fn log_file_lives_in_profile_data_dir() {
        if let Ok(path) = log_file_path(Profile::Dev) {
            assert!(path.ends_with(LOG_FILE_NAME));
            assert!(path.to_string_lossy().contains("tagpost-dev"));
        }
    }
}
