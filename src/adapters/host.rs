use crate::domain::model::{CommandOutput, Platform};
use crate::domain::ports::Host;
use crate::utils::error::{DoctorError, Result};
use async_trait::async_trait;
use nix::sys::signal::{kill, Signal};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use sysinfo::{Disks, Pid, ProcessesToUpdate, System};
use tokio::net::TcpStream;

const PROBE_TIMEOUT: Duration = Duration::from_millis(300);

/// True when something accepts TCP connections on the loopback port.
pub async fn probe_port(port: u16) -> bool {
    let candidates = [
        SocketAddr::from((Ipv4Addr::LOCALHOST, port)),
        SocketAddr::from((Ipv6Addr::LOCALHOST, port)),
    ];
    for addr in candidates {
        if let Ok(Ok(_)) = tokio::time::timeout(PROBE_TIMEOUT, TcpStream::connect(addr)).await {
            return true;
        }
    }
    false
}

/// The real machine: child processes, sockets, the process table and disks.
#[derive(Debug, Default, Clone)]
pub struct SystemHost;

impl SystemHost {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Host for SystemHost {
    async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        tracing::debug!("Running {} {}", program, args.join(" "));

        // stdin stays attached so sudo can ask for a password.
        let output = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::inherit())
            .output()
            .await
            .map_err(|e| DoctorError::command(program, e.to_string()))?;

        let result = CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        if !result.success {
            tracing::debug!("{} exited with {}: {}", program, output.status, result.stderr.trim());
        }
        Ok(result)
    }

    fn has_program(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }

    fn platform(&self) -> Platform {
        Platform::current()
    }

    async fn is_listening(&self, port: u16) -> bool {
        probe_port(port).await
    }

    fn process_name(&self, pid: u32) -> Option<String> {
        let pid = Pid::from_u32(pid);
        let mut system = System::new();
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        system
            .process(pid)
            .map(|process| process.name().to_string_lossy().into_owned())
    }

    fn terminate(&self, pid: u32) -> Result<()> {
        let raw = i32::try_from(pid)
            .map_err(|_| DoctorError::command("kill", format!("pid {} out of range", pid)))?;
        kill(nix::unistd::Pid::from_raw(raw), Signal::SIGTERM)
            .map_err(|e| DoctorError::command("kill", format!("pid {}: {}", pid, e)))
    }

    fn available_space(&self, path: &Path) -> Result<u64> {
        let path = path.canonicalize()?;
        let disks = Disks::new_with_refreshed_list();

        // The deepest mount point containing the path is the one it lives on.
        disks
            .list()
            .iter()
            .filter(|disk| path.starts_with(disk.mount_point()))
            .max_by_key(|disk| disk.mount_point().as_os_str().len())
            .map(|disk| disk.available_space())
            .ok_or_else(|| {
                DoctorError::IoError(std::io::Error::other(format!(
                    "no mounted filesystem contains {}",
                    path.display()
                )))
            })
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
