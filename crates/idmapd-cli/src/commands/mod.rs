//! CLI command definitions and dispatch.

pub mod add;
pub mod current;
pub mod default;
pub mod shift;
pub mod translate;
pub mod validate;
pub mod write_map;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use idmapd_common::config::IdmapdConfig;
use idmapd_core::IdmapSet;

/// idmapd: namespace uid/gid mapping for system containers.
#[derive(Parser, Debug)]
#[command(name = "idmapd", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Path to a JSON configuration file.
    #[arg(long, global = true, env = "IDMAPD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the default allocation for new containers.
    Default(default::DefaultArgs),
    /// Print what the current namespace has been granted.
    Current(current::CurrentArgs),
    /// Check that a mapping can be granted in the current namespace.
    Validate(validate::ValidateArgs),
    /// Insert an entry into a mapping, splitting what it overlaps.
    Add(add::AddArgs),
    /// Translate a uid/gid pair across the namespace boundary.
    Translate(translate::TranslateArgs),
    /// Re-own a container root filesystem.
    Shift(shift::ShiftArgs),
    /// Write a mapping into a process's kernel id maps.
    WriteMap(write_map::WriteMapArgs),
}

/// Mapping selection shared by commands that operate on a mapping.
#[derive(Args, Debug)]
pub struct MapArgs {
    /// Mapping entries (`u|g|b:ns:host:len`). Defaults to the configured mapping.
    #[arg(long = "map", value_name = "ENTRY")]
    pub entries: Vec<String>,
}

impl MapArgs {
    /// Builds the mapping and checks the current namespace can grant it.
    ///
    /// # Errors
    ///
    /// Returns an error if an entry is malformed or conflicting, or if the
    /// mapping isn't usable in the current namespace.
    pub fn load(&self, config: &IdmapdConfig) -> anyhow::Result<IdmapSet> {
        if self.entries.is_empty() {
            return Ok(idmapd_core::resolve_idmap(config)?);
        }
        let set = IdmapSet::from_raw_entries(&self.entries)?;
        set.usable(config)?;
        Ok(set)
    }

    /// Builds the mapping from `--map` entries without checking grants.
    ///
    /// Falls back to the validated configured mapping when no entries are
    /// given.
    ///
    /// # Errors
    ///
    /// Returns an error if an entry is malformed or conflicting.
    pub fn parse(&self, config: &IdmapdConfig) -> anyhow::Result<IdmapSet> {
        if self.entries.is_empty() {
            return Ok(idmapd_core::resolve_idmap(config)?);
        }
        Ok(IdmapSet::from_raw_entries(&self.entries)?)
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<IdmapdConfig> {
    match &cli.config {
        Some(path) => Ok(IdmapdConfig::load(path)?),
        None => Ok(IdmapdConfig::default()),
    }
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    tracing::debug!(?config, "loaded configuration");

    match cli.command {
        Command::Default(args) => default::execute(&args, &config),
        Command::Current(args) => current::execute(&args, &config),
        Command::Validate(args) => validate::execute(&args, &config),
        Command::Add(args) => add::execute(&args),
        Command::Translate(args) => translate::execute(&args, &config),
        Command::Shift(args) => shift::execute(&args, &config),
        Command::WriteMap(args) => write_map::execute(&args, &config),
    }
}
