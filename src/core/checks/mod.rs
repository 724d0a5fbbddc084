mod disk;
mod docker;
mod environment;
pub mod permissions;
pub mod ports;
mod resources;

pub use disk::DiskSpaceCheck;
pub use docker::{daemon_version, DockerCheck};
pub use environment::EnvironmentCheck;
pub use permissions::PermissionsCheck;
pub use ports::PortsCheck;
pub use resources::DockerResourcesCheck;

use crate::core::doctor::DoctorContext;
use crate::domain::model::CheckOutcome;
use crate::utils::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait Check: Send + Sync {
    /// Short identifier used in the summary and logs.
    fn name(&self) -> &'static str;

    fn title(&self) -> &'static str;

    async fn run(&self, ctx: &mut DoctorContext) -> Result<CheckOutcome>;
}
