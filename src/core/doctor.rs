use crate::config::toml_config::DoctorConfig;
use crate::core::checks::{
    Check, DiskSpaceCheck, DockerCheck, DockerResourcesCheck, EnvironmentCheck, PermissionsCheck,
    PortsCheck,
};
use crate::domain::model::{CheckOutcome, CheckResult, DoctorReport};
use crate::domain::ports::{Host, Prompter};
use crate::utils::output::Reporter;
use std::path::{Path, PathBuf};

/// State shared by all checks during one run.
pub struct DoctorContext {
    pub root: PathBuf,
    pub config: DoctorConfig,
    pub host: Box<dyn Host>,
    pub prompter: Box<dyn Prompter>,
    pub reporter: Reporter,
    fixes_applied: bool,
}

impl DoctorContext {
    pub fn new(
        root: PathBuf,
        config: DoctorConfig,
        host: Box<dyn Host>,
        prompter: Box<dyn Prompter>,
        reporter: Reporter,
    ) -> Self {
        Self {
            root,
            config,
            host,
            prompter,
            reporter,
            fixes_applied: false,
        }
    }

    /// Resolves a configured file name against the project root.
    pub fn path(&self, relative: &str) -> PathBuf {
        let candidate = Path::new(relative);
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.root.join(candidate)
        }
    }

    pub fn mark_fixed(&mut self) {
        self.fixes_applied = true;
    }

    pub fn fixes_applied(&self) -> bool {
        self.fixes_applied
    }
}

pub struct Doctor {
    checks: Vec<Box<dyn Check>>,
}

impl Doctor {
    pub fn new(checks: Vec<Box<dyn Check>>) -> Self {
        Self { checks }
    }

    /// All checks in their fixed order.
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(DockerCheck),
            Box::new(PortsCheck),
            Box::new(DiskSpaceCheck),
            Box::new(PermissionsCheck),
            Box::new(EnvironmentCheck),
            Box::new(DockerResourcesCheck),
        ])
    }

    /// Runs every check to completion. A failing check never stops the run.
    pub async fn run(&self, ctx: &mut DoctorContext) -> DoctorReport {
        let started = chrono::Local::now();
        ctx.reporter.banner("Development environment doctor");
        ctx.reporter.info(&format!(
            "Project: {} ({})",
            ctx.root.display(),
            started.format("%Y-%m-%d %H:%M:%S")
        ));

        let mut results = Vec::with_capacity(self.checks.len());
        for check in &self.checks {
            ctx.reporter.section(check.title());
            tracing::debug!("Running check {}", check.name());

            let outcome = match check.run(ctx).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!("Check {} errored: {}", check.name(), e);
                    ctx.reporter.error(&format!(
                        "{} check could not complete: {}",
                        check.title(),
                        e
                    ));
                    ctx.reporter.hint(e.recovery_suggestion());
                    CheckOutcome::Failed
                }
            };
            tracing::info!(check = check.name(), %outcome, "Check finished");
            results.push(CheckResult {
                name: check.name(),
                outcome,
            });
        }

        let report = DoctorReport {
            results,
            fixes_applied: ctx.fixes_applied(),
        };
        print_summary(ctx, &report);
        report
    }
}

fn print_summary(ctx: &mut DoctorContext, report: &DoctorReport) {
    ctx.reporter.section("Summary");
    for result in &report.results {
        let line = format!("{:<20} {}", result.name, result.outcome);
        match result.outcome {
            CheckOutcome::Passed | CheckOutcome::Fixed => ctx.reporter.ok(&line),
            CheckOutcome::Skipped => ctx.reporter.info(&line),
            CheckOutcome::Warning => ctx.reporter.warn(&line),
            CheckOutcome::Failed => ctx.reporter.error(&line),
        }
    }

    ctx.reporter.plain("");
    if report.fixes_applied {
        ctx.reporter
            .fix("Fixes were applied. Run the doctor again to confirm, then `docker compose up`.");
    } else if report.count(CheckOutcome::Warning) + report.count(CheckOutcome::Failed) == 0 {
        ctx.reporter.ok("Environment looks good. No changes were needed.");
    } else {
        ctx.reporter.warn("Some problems remain. Review the messages above.");
    }
}
