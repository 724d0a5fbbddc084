pub mod toml_config;

#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "devenv-doctor")]
#[command(about = "Checks and repairs the local Docker Compose development environment")]
pub struct CliConfig {
    /// Optional TOML file overriding the built-in checks
    #[arg(short, long, default_value = toml_config::DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Project directory holding the compose and env files
    #[arg(short, long, default_value = ".")]
    pub root: PathBuf,

    /// Answer every prompt with its default
    #[arg(short, long, conflicts_with = "no_fix")]
    pub yes: bool,

    /// Decline every prompt; only unprompted permission fixes are applied
    #[arg(long)]
    pub no_fix: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    /// Emit diagnostics on stderr as JSON
    #[arg(long)]
    pub log_json: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// A relative config path is resolved against the project root.
    pub fn config_path(&self) -> PathBuf {
        if self.config.is_absolute() {
            self.config.clone()
        } else {
            self.root.join(&self.config)
        }
    }
}
