use crate::core::checks::Check;
use crate::core::doctor::DoctorContext;
use crate::domain::model::CheckOutcome;
use crate::utils::error::Result;
use async_trait::async_trait;

const GIB: u64 = 1024 * 1024 * 1024;

pub struct DiskSpaceCheck;

#[async_trait]
impl Check for DiskSpaceCheck {
    fn name(&self) -> &'static str {
        "disk_space"
    }

    fn title(&self) -> &'static str {
        "Disk space"
    }

    async fn run(&self, ctx: &mut DoctorContext) -> Result<CheckOutcome> {
        let available = ctx.host.available_space(&ctx.root)?;
        let minimum = ctx.config.disk.min_free_gb;
        let free_gb = available as f64 / GIB as f64;

        if available < minimum.saturating_mul(GIB) {
            ctx.reporter.warn(&format!(
                "Only {:.1} GB free; at least {} GB is recommended for images and volumes",
                free_gb, minimum
            ));
            ctx.reporter.hint(
                "Reclaim space with `docker system prune` (add --volumes to drop unused volumes)",
            );
            return Ok(CheckOutcome::Warning);
        }

        ctx.reporter.ok(&format!("{:.1} GB free disk space", free_gb));
        Ok(CheckOutcome::Passed)
    }
}
