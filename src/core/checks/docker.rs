use crate::core::checks::Check;
use crate::core::doctor::DoctorContext;
use crate::domain::model::{CheckOutcome, Platform};
use crate::domain::ports::Host;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub struct DockerCheck;

/// Server version when the daemon answers, `None` when it does not.
pub async fn daemon_version(host: &dyn Host) -> Result<Option<String>> {
    let output = host
        .run("docker", &["info", "--format", "{{.ServerVersion}}"])
        .await?;
    let version = output.stdout.trim();
    Ok((output.success && !version.is_empty()).then(|| version.to_string()))
}

fn install_hint(platform: Platform) -> &'static str {
    match platform {
        Platform::MacOs => "Install Docker Desktop: https://docs.docker.com/desktop/install/mac-install/",
        Platform::Linux => "Install Docker Engine: https://docs.docker.com/engine/install/",
        Platform::Other => "Install Docker: https://docs.docker.com/get-docker/",
    }
}

const MACOS_START: &[&str] = &["-a", "Docker"];
const SYSTEMD_START: &[&str] = &["systemctl", "start", "docker"];

fn start_command(host: &dyn Host) -> Option<(&'static str, &'static [&'static str])> {
    match host.platform() {
        Platform::MacOs => Some(("open", MACOS_START)),
        Platform::Linux if host.has_program("systemctl") => Some(("sudo", SYSTEMD_START)),
        _ => None,
    }
}

impl DockerCheck {
    async fn start_daemon(&self, ctx: &mut DoctorContext) -> Result<CheckOutcome> {
        let Some((program, args)) = start_command(ctx.host.as_ref()) else {
            ctx.reporter.error("Docker is not running and cannot be started automatically here");
            ctx.reporter.hint("Start the Docker daemon by hand and run the doctor again");
            return Ok(CheckOutcome::Failed);
        };

        if !ctx.prompter.confirm("Start the Docker daemon now?", true)? {
            ctx.reporter.error("Docker is not running; most other steps will not work");
            ctx.reporter.hint(&format!("Start it with `{} {}`", program, args.join(" ")));
            return Ok(CheckOutcome::Failed);
        }

        ctx.reporter.fix(&format!("Starting Docker with `{} {}`", program, args.join(" ")));
        let output = ctx.host.run(program, args).await?;
        if !output.success {
            ctx.reporter.error(&format!("Could not start Docker: {}", output.stderr.trim()));
            return Ok(CheckOutcome::Failed);
        }
        ctx.mark_fixed();

        let attempts = ctx.config.docker.start_attempts;
        let interval = Duration::from_millis(ctx.config.docker.poll_interval_ms);
        ctx.reporter.info("Waiting for the Docker daemon to become ready...");
        for attempt in 1..=attempts {
            if let Some(version) = daemon_version(ctx.host.as_ref()).await? {
                ctx.reporter.ok(&format!("Docker daemon is ready (server {})", version));
                return Ok(CheckOutcome::Fixed);
            }
            tracing::debug!(attempt, attempts, "Docker daemon not ready yet");
            ctx.host.sleep(interval).await;
        }

        ctx.reporter.error(&format!(
            "Docker daemon did not become ready after {} attempts",
            attempts
        ));
        Ok(CheckOutcome::Failed)
    }

    async fn check_compose(&self, ctx: &mut DoctorContext) -> Result<CheckOutcome> {
        let output = ctx
            .host
            .run("docker", &["compose", "version", "--short"])
            .await?;
        if output.success {
            ctx.reporter.ok(&format!("Docker Compose {}", output.stdout.trim()));
            return Ok(CheckOutcome::Passed);
        }

        if ctx.host.has_program("docker-compose") {
            ctx.reporter.warn("Only the legacy docker-compose binary is installed");
            ctx.reporter.hint("Install the Compose v2 plugin to use `docker compose`");
        } else {
            ctx.reporter.warn("Docker Compose is not installed");
            ctx.reporter.hint("https://docs.docker.com/compose/install/");
        }
        Ok(CheckOutcome::Warning)
    }
}

#[async_trait]
impl Check for DockerCheck {
    fn name(&self) -> &'static str {
        "docker"
    }

    fn title(&self) -> &'static str {
        "Docker daemon"
    }

    async fn run(&self, ctx: &mut DoctorContext) -> Result<CheckOutcome> {
        if !ctx.host.has_program("docker") {
            ctx.reporter.error("The docker CLI is not on PATH");
            ctx.reporter.hint(install_hint(ctx.host.platform()));
            return Ok(CheckOutcome::Failed);
        }

        let outcome = match daemon_version(ctx.host.as_ref()).await? {
            Some(version) => {
                ctx.reporter.ok(&format!("Docker daemon is running (server {})", version));
                CheckOutcome::Passed
            }
            None => {
                ctx.reporter.warn("Docker daemon is not reachable");
                self.start_daemon(ctx).await?
            }
        };

        if outcome == CheckOutcome::Failed {
            return Ok(outcome);
        }
        Ok(outcome.combine(self.check_compose(ctx).await?))
    }
}
