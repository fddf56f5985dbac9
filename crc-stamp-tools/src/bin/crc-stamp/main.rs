mod cmd;
mod util;

use std::ffi::OsString;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use crc_stamp::Perturbation;
use figment::providers::{Data, Env, Format as _, Json, Toml, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::util::logging::{setup_logging, LevelFilter, LogOptions};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub(crate) struct Config {
    /// Log level used when `--log-level` is not given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<LevelFilter>,
    /// Amount added to the checksum word in corrupt mode.
    pub corruption_offset: NonZeroU32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: None,
            corruption_offset: Perturbation::DEFAULT.amount(),
        }
    }
}

fn main() -> Result<()> {
    let args: Vec<_> = std::env::args_os().collect();

    let config = load_config().context("Failed to load configuration.")?;

    // `crc-check` shares this binary, see `src/bin/crc-check.rs`.
    if let Some(args) = multicall_check(&args, "crc-check") {
        let cmd = cmd::check::Cmd::parse_from(args);
        let (log_path, level) = log_settings(&cmd.log, &config);
        let _logger_guard = setup_logging(log_path.as_deref(), level)?;

        return cmd.run();
    }

    let cmd = cmd::stamp::Cmd::parse_from(args);
    let (log_path, level) = log_settings(&cmd.log, &config);
    let _logger_guard = setup_logging(log_path.as_deref(), level)?;

    cmd.run(Perturbation::new(config.corruption_offset))
}

/// The command line wins over the configuration file.
fn log_settings(log: &LogOptions, config: &Config) -> (Option<PathBuf>, Option<LevelFilter>) {
    (log.log_file.clone(), log.log_level.or(config.log_level))
}

/// Returns the cleaned arguments for the handler of the respective end binary
/// (crc-stamp or crc-check)
fn multicall_check<'list>(args: &'list [OsString], want: &str) -> Option<&'list [OsString]> {
    let argv0 = Path::new(args.first()?);
    if let Some(command) = argv0.file_stem().and_then(|f| f.to_str()) {
        if command == want {
            return Some(args);
        }
    }

    if let Some(command) = args.get(1).and_then(|f| f.to_str()) {
        if command == want {
            return Some(&args[1..]);
        }
    }

    None
}

fn load_config() -> anyhow::Result<Config> {
    // Paths to search for the configuration file, lowest precedence first.
    let mut paths = Vec::new();
    if let Some(home) = directories::UserDirs::new().map(|user| user.home_dir().to_path_buf()) {
        paths.push(home);
    }
    paths.push(PathBuf::from("."));

    // Files to search for, without extension.
    let files = [".crc-stamp"];

    let default_config = serde_json::to_string_pretty(&Config::default())?;
    let mut figment = Figment::from(Data::<Json>::string(&default_config));
    for path in paths {
        for file in files {
            figment = figment
                .merge(Toml::file(path.join(format!("{file}.toml"))))
                .merge(Json::file(path.join(format!("{file}.json"))))
                .merge(Yaml::file(path.join(format!("{file}.yaml"))))
                .merge(Yaml::file(path.join(format!("{file}.yml"))));
        }
    }
    figment = figment.merge(Env::prefixed("CRC_STAMP_").only(&["log_level", "corruption_offset"]));

    let config = figment.extract::<Config>()?;

    Ok(config)
}
