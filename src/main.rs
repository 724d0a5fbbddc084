use anyhow::Context;
use clap::Parser;
use devenv_doctor::domain::ports::Prompter;
use devenv_doctor::utils::output::Reporter;
use devenv_doctor::utils::{logger, validation::Validate};
use devenv_doctor::{
    AutoPrompter, CliConfig, ConsolePrompter, Doctor, DoctorConfig, DoctorContext, SystemHost,
};
use std::path::Path;

fn load_config(path: &Path) -> anyhow::Result<DoctorConfig> {
    let config = DoctorConfig::load_or_default(path)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;
    Ok(config)
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::info!("Starting devenv-doctor");
    tracing::debug!("CLI config: {:?}", cli);

    let mut reporter = Reporter::stdout();

    // An unusable config file is reported, never fatal: the doctor always runs.
    let config_path = cli.config_path();
    let config = match load_config(&config_path) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{:#}", e);
            reporter.error(&format!("{:#}", e));
            reporter.hint("Continuing with the built-in defaults");
            DoctorConfig::default()
        }
    };

    let prompter: Box<dyn Prompter> = if cli.yes {
        Box::new(AutoPrompter::accept_defaults())
    } else if cli.no_fix {
        Box::new(AutoPrompter::decline_all())
    } else {
        Box::new(ConsolePrompter::stdin())
    };

    let mut ctx = DoctorContext::new(
        cli.root.clone(),
        config,
        Box::new(SystemHost::new()),
        prompter,
        reporter,
    );

    let report = Doctor::standard().run(&mut ctx).await;
    tracing::info!(
        fixes_applied = report.fixes_applied,
        checks = report.results.len(),
        "devenv-doctor finished"
    );
}
