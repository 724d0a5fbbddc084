use crate::core::checks::Check;
use crate::core::doctor::DoctorContext;
use crate::domain::model::CheckOutcome;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::fs::{self, Permissions};
use std::io::ErrorKind;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

pub struct PermissionsCheck;

/// Permission bits of `path`, or `None` if it does not exist.
pub fn file_mode(path: &Path) -> Result<Option<u32>> {
    match fs::metadata(path) {
        Ok(metadata) => Ok(Some(metadata.permissions().mode() & 0o777)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn set_mode(path: &Path, mode: u32) -> Result<()> {
    fs::set_permissions(path, Permissions::from_mode(mode))?;
    Ok(())
}

impl PermissionsCheck {
    /// Warns when the env file would be committed.
    async fn check_git_ignore(&self, ctx: &mut DoctorContext) -> Result<CheckOutcome> {
        let env_file = ctx.config.environment.file.clone();
        if !ctx.host.has_program("git") || !ctx.path(&env_file).exists() {
            return Ok(CheckOutcome::Skipped);
        }

        let root = ctx.root.to_string_lossy().into_owned();
        let inside = ctx
            .host
            .run("git", &["-C", root.as_str(), "rev-parse", "--is-inside-work-tree"])
            .await?;
        if !inside.success {
            tracing::debug!("{} is not a git work tree", root);
            return Ok(CheckOutcome::Skipped);
        }

        let ignored = ctx
            .host
            .run("git", &["-C", root.as_str(), "check-ignore", "-q", env_file.as_str()])
            .await?;
        if ignored.success {
            ctx.reporter.ok(&format!("{} is ignored by git", env_file));
            Ok(CheckOutcome::Passed)
        } else {
            ctx.reporter.warn(&format!("{} is not ignored by git and may be committed", env_file));
            ctx.reporter.hint(&format!("Add `{}` to .gitignore", env_file));
            Ok(CheckOutcome::Warning)
        }
    }
}

#[async_trait]
impl Check for PermissionsCheck {
    fn name(&self) -> &'static str {
        "permissions"
    }

    fn title(&self) -> &'static str {
        "File permissions"
    }

    async fn run(&self, ctx: &mut DoctorContext) -> Result<CheckOutcome> {
        let expected = ctx.config.permission_mode()?;
        let files = ctx.config.permissions.files.clone();

        let mut outcome = CheckOutcome::Skipped;
        for file in &files {
            let path = ctx.path(file);
            let Some(mode) = file_mode(&path)? else {
                tracing::debug!("{} not present, skipping", path.display());
                continue;
            };

            if mode == expected {
                ctx.reporter.ok(&format!("{} has mode {:o}", file, mode));
                outcome = outcome.combine(CheckOutcome::Passed);
            } else {
                set_mode(&path, expected)?;
                ctx.mark_fixed();
                ctx.reporter.fix(&format!(
                    "Changed {} from mode {:o} to {:o}",
                    file, mode, expected
                ));
                outcome = outcome.combine(CheckOutcome::Fixed);
            }
        }

        if outcome == CheckOutcome::Skipped {
            ctx.reporter.info("No sensitive files present yet");
        }

        Ok(outcome.combine(self.check_git_ignore(ctx).await?))
    }
}
