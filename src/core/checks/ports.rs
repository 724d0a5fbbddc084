use crate::core::checks::permissions::set_mode;
use crate::core::checks::Check;
use crate::core::doctor::DoctorContext;
use crate::domain::env_file::EnvFile;
use crate::domain::model::{CheckOutcome, PortSpec};
use crate::domain::ports::Host;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

/// How far above a taken port to look for a replacement.
const ALTERNATE_PORT_RANGE: u16 = 100;

const RESOLUTIONS: [&str; 2] = ["Stop the process using the port", "Use an alternate port"];

pub struct PortsCheck;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortOwner {
    pub pid: u32,
    pub name: Option<String>,
}

impl PortOwner {
    /// Docker's own port forwarders; these mean the stack is already up.
    pub fn is_docker(&self) -> bool {
        self.name.as_deref().is_some_and(|name| {
            let name = name.to_ascii_lowercase();
            name.starts_with("com.docker")
                || name == "docker-proxy"
                || name == "vpnkit"
                || name == "dockerd"
        })
    }
}

fn describe(owners: &[PortOwner]) -> String {
    if owners.is_empty() {
        return "an unknown process".to_string();
    }
    owners
        .iter()
        .map(|owner| match &owner.name {
            Some(name) => format!("{} (pid {})", name, owner.pid),
            None => format!("pid {}", owner.pid),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Processes listening on `port`, as reported by lsof.
pub async fn find_owners(host: &dyn Host, port: u16) -> Result<Vec<PortOwner>> {
    if !host.has_program("lsof") {
        tracing::debug!("lsof not found; cannot identify the owner of port {}", port);
        return Ok(Vec::new());
    }

    let filter = format!("-iTCP:{}", port);
    // lsof exits 1 when nothing matches, so only stdout matters.
    let output = host
        .run("lsof", &["-nP", filter.as_str(), "-sTCP:LISTEN", "-t"])
        .await?;

    let mut seen = HashSet::new();
    Ok(output
        .stdout
        .lines()
        .filter_map(|line| line.trim().parse::<u32>().ok())
        .filter(|pid| seen.insert(*pid))
        .map(|pid| PortOwner {
            pid,
            name: host.process_name(pid),
        })
        .collect())
}

/// First port above `port` that is neither listening nor reserved by another service.
pub async fn next_free_port(host: &dyn Host, port: u16, reserved: &HashSet<u16>) -> Option<u16> {
    let last = port.saturating_add(ALTERNATE_PORT_RANGE);
    for candidate in port.saturating_add(1)..=last {
        if candidate == port || reserved.contains(&candidate) {
            continue;
        }
        if !host.is_listening(candidate).await {
            return Some(candidate);
        }
    }
    None
}

/// Upserts `key=port` into the overrides file, creating it with `mode`.
/// Returns false when the file already held that value.
pub fn write_port_override(path: &Path, key: &str, port: u16, mode: u32) -> Result<bool> {
    let existed = path.exists();
    let mut file = if existed {
        EnvFile::load(path)?
    } else {
        let header = format!(
            "# Host port overrides written by devenv-doctor on {}\n",
            chrono::Local::now().format("%Y-%m-%d")
        );
        EnvFile::parse(&path.display().to_string(), &header)?
    };

    if !file.set(key, &port.to_string()) {
        return Ok(false);
    }
    file.save(path)?;
    if !existed {
        set_mode(path, mode)?;
    }
    Ok(true)
}

fn read_overrides(path: &Path) -> Result<Option<EnvFile>> {
    if path.exists() {
        Ok(Some(EnvFile::load(path)?))
    } else {
        Ok(None)
    }
}

/// The port a service will actually bind: its override if one was written.
fn effective_port(spec: &PortSpec, overrides: Option<&EnvFile>) -> u16 {
    overrides
        .and_then(|file| file.get(&spec.env_var))
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(spec.port)
}

impl PortsCheck {
    async fn resolve_conflict(
        &self,
        ctx: &mut DoctorContext,
        spec: &PortSpec,
        port: u16,
        owners: &[PortOwner],
        reserved: &mut HashSet<u16>,
    ) -> Result<CheckOutcome> {
        let question = format!("How should the conflict on port {} be resolved?", port);
        match ctx.prompter.choose(&question, &RESOLUTIONS, 1)? {
            Some(0) => self.stop_owners(ctx, port, owners).await,
            Some(_) => self.remap(ctx, spec, port, reserved).await,
            None => {
                ctx.reporter.warn(&format!("Left port {} in use", port));
                ctx.reporter.hint(&format!(
                    "{} will fail to start until the port is free",
                    spec.service
                ));
                Ok(CheckOutcome::Warning)
            }
        }
    }

    async fn stop_owners(
        &self,
        ctx: &mut DoctorContext,
        port: u16,
        owners: &[PortOwner],
    ) -> Result<CheckOutcome> {
        if owners.is_empty() {
            ctx.reporter.error(&format!("Could not identify the process on port {}", port));
            ctx.reporter.hint("Install lsof, or pick the alternate port option");
            return Ok(CheckOutcome::Warning);
        }

        let question = format!("Send SIGTERM to {}?", describe(owners));
        if !ctx.prompter.confirm(&question, false)? {
            ctx.reporter.warn(&format!("Left port {} in use", port));
            return Ok(CheckOutcome::Warning);
        }

        let mut stopped = 0;
        for owner in owners {
            match ctx.host.terminate(owner.pid) {
                Ok(()) => {
                    stopped += 1;
                    ctx.reporter.fix(&format!("Sent SIGTERM to pid {}", owner.pid));
                }
                Err(e) => ctx.reporter.error(&format!("Could not stop pid {}: {}", owner.pid, e)),
            }
        }
        if stopped == 0 {
            return Ok(CheckOutcome::Warning);
        }
        ctx.mark_fixed();

        // Give the process a moment to release the socket.
        for _ in 0..5 {
            if !ctx.host.is_listening(port).await {
                ctx.reporter.ok(&format!("Port {} is now free", port));
                return Ok(CheckOutcome::Fixed);
            }
            ctx.host.sleep(Duration::from_millis(500)).await;
        }
        ctx.reporter.warn(&format!("Port {} is still in use", port));
        Ok(CheckOutcome::Warning)
    }

    async fn remap(
        &self,
        ctx: &mut DoctorContext,
        spec: &PortSpec,
        port: u16,
        reserved: &mut HashSet<u16>,
    ) -> Result<CheckOutcome> {
        let Some(alternate) = next_free_port(ctx.host.as_ref(), port, reserved).await else {
            ctx.reporter.error(&format!(
                "No free port within {} above {}",
                ALTERNATE_PORT_RANGE, port
            ));
            return Ok(CheckOutcome::Warning);
        };
        reserved.insert(alternate);

        let mode = ctx.config.permission_mode()?;
        let path = ctx.path(&ctx.config.environment.ports_file);
        write_port_override(&path, &spec.env_var, alternate, mode)?;
        ctx.mark_fixed();
        ctx.reporter.fix(&format!(
            "{} moved to port {}: {}={} written to {}",
            spec.service,
            alternate,
            spec.env_var,
            alternate,
            ctx.config.environment.ports_file
        ));
        ctx.reporter.hint(&format!(
            "Map the service with \"${{{}:-{}}}:{}\" in docker-compose.yml",
            spec.env_var, spec.port, spec.port
        ));
        Ok(CheckOutcome::Fixed)
    }
}

#[async_trait]
impl Check for PortsCheck {
    fn name(&self) -> &'static str {
        "ports"
    }

    fn title(&self) -> &'static str {
        "Port availability"
    }

    async fn run(&self, ctx: &mut DoctorContext) -> Result<CheckOutcome> {
        let specs = ctx.config.ports.clone();
        let overrides = read_overrides(&ctx.path(&ctx.config.environment.ports_file))?;
        let ports: Vec<u16> = specs
            .iter()
            .map(|spec| effective_port(spec, overrides.as_ref()))
            .collect();
        let mut reserved: HashSet<u16> = specs
            .iter()
            .map(|spec| spec.port)
            .chain(ports.iter().copied())
            .collect();

        let mut outcome = CheckOutcome::Passed;
        for (spec, port) in specs.iter().zip(ports) {
            let label = if port == spec.port {
                spec.service.clone()
            } else {
                format!("{}, remapped from {}", spec.service, spec.port)
            };

            if !ctx.host.is_listening(port).await {
                ctx.reporter.ok(&format!("Port {} is free ({})", port, label));
                continue;
            }

            let owners = find_owners(ctx.host.as_ref(), port).await?;
            if !owners.is_empty() && owners.iter().all(PortOwner::is_docker) {
                ctx.reporter.info(&format!(
                    "Port {} ({}) is held by Docker; the stack is probably running",
                    port, label
                ));
                continue;
            }

            ctx.reporter.warn(&format!(
                "Port {} ({}) is in use by {}",
                port,
                label,
                describe(&owners)
            ));
            let resolved = self
                .resolve_conflict(ctx, spec, port, &owners, &mut reserved)
                .await?;
            outcome = outcome.combine(resolved);
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_docker_owners_are_recognised() {
        let owner = |name: &str| PortOwner {
            pid: 1,
            name: Some(name.to_string()),
        };
        assert!(owner("com.docker.backend").is_docker());
        assert!(owner("docker-proxy").is_docker());
        assert!(owner("vpnkit").is_docker());
        assert!(owner("dockerd").is_docker());
        assert!(!owner("docker-compose-ui").is_docker());
        assert!(!owner("postgres").is_docker());
        assert!(!PortOwner { pid: 1, name: None }.is_docker());
    }

    #[test]
    fn test_describe_owners() {
        let owners = vec![
            PortOwner {
                pid: 42,
                name: Some("node".to_string()),
            },
            PortOwner { pid: 7, name: None },
        ];
        assert_eq!(describe(&owners), "node (pid 42), pid 7");
        assert_eq!(describe(&[]), "an unknown process");
    }

    #[test]
    fn test_effective_port_prefers_override() {
        let spec = PortSpec::new(3000, "API", "API_PORT");
        let overrides = EnvFile::parse(".env.ports", "API_PORT=3002\n").unwrap();
        assert_eq!(effective_port(&spec, Some(&overrides)), 3002);
        assert_eq!(effective_port(&spec, None), 3000);

        let garbage = EnvFile::parse(".env.ports", "API_PORT=abc\n").unwrap();
        assert_eq!(effective_port(&spec, Some(&garbage)), 3000);
    }

    #[test]
    fn test_write_port_override_creates_private_file() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(".env.ports");

        assert!(write_port_override(&path, "API_PORT", 3002, 0o600).unwrap());
        assert!(!write_port_override(&path, "API_PORT", 3002, 0o600).unwrap());
        assert!(write_port_override(&path, "DB_PORT", 5433, 0o600).unwrap());

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# Host port overrides"));
        assert!(content.contains("API_PORT=3002\n"));
        assert!(content.ends_with("DB_PORT=5433\n"));

        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn test_write_port_override_uses_given_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(".env.ports");
        assert!(write_port_override(&path, "API_PORT", 3002, 0o640).unwrap());

        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
    }
}
