use crate::core::checks::Check;
use crate::core::doctor::DoctorContext;
use crate::domain::model::{CheckOutcome, Platform};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::Deserialize;

const GIB: u64 = 1024 * 1024 * 1024;

pub struct DockerResourcesCheck;

/// The fields of `docker info` this check reads.
#[derive(Debug, Deserialize)]
struct DockerInfo {
    #[serde(rename = "MemTotal", default)]
    mem_total: u64,
    #[serde(rename = "NCPU", default)]
    ncpu: u64,
    #[serde(rename = "OperatingSystem", default)]
    operating_system: String,
}

fn resources_hint(platform: Platform) -> &'static str {
    match platform {
        Platform::MacOs => "Raise the limits in Docker Desktop > Settings > Resources",
        _ => "Docker uses the host's resources directly; free memory or stop other workloads",
    }
}

#[async_trait]
impl Check for DockerResourcesCheck {
    fn name(&self) -> &'static str {
        "docker_resources"
    }

    fn title(&self) -> &'static str {
        "Docker resources"
    }

    async fn run(&self, ctx: &mut DoctorContext) -> Result<CheckOutcome> {
        if !ctx.host.has_program("docker") {
            ctx.reporter.info("Docker CLI not found; skipping resource check");
            return Ok(CheckOutcome::Skipped);
        }

        let output = ctx
            .host
            .run("docker", &["info", "--format", "{{json .}}"])
            .await?;
        if !output.success {
            ctx.reporter.info("Docker daemon not reachable; skipping resource check");
            return Ok(CheckOutcome::Skipped);
        }

        let info: DockerInfo = serde_json::from_str(output.stdout.trim())?;
        tracing::debug!(?info, "Docker info");

        let memory_gb = info.mem_total as f64 / GIB as f64;
        let limits = &ctx.config.resources;
        let low_memory = info.mem_total < limits.min_memory_gb.saturating_mul(GIB);
        let low_cpus = info.ncpu < limits.min_cpus;
        let (min_memory_gb, min_cpus) = (limits.min_memory_gb, limits.min_cpus);

        if !info.operating_system.is_empty() {
            ctx.reporter.info(&format!("Docker runs on {}", info.operating_system));
        }

        if low_memory {
            ctx.reporter.warn(&format!(
                "Docker has {:.1} GB of memory; at least {} GB is recommended",
                memory_gb, min_memory_gb
            ));
        } else {
            ctx.reporter.ok(&format!("Docker memory: {:.1} GB", memory_gb));
        }

        if low_cpus {
            ctx.reporter.warn(&format!(
                "Docker has {} CPU(s); at least {} are recommended",
                info.ncpu, min_cpus
            ));
        } else {
            ctx.reporter.ok(&format!("Docker CPUs: {}", info.ncpu));
        }

        if low_memory || low_cpus {
            ctx.reporter.hint(resources_hint(ctx.host.platform()));
            return Ok(CheckOutcome::Warning);
        }
        Ok(CheckOutcome::Passed)
    }
}
