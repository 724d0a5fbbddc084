use crate::core::checks::permissions::set_mode;
use crate::core::checks::Check;
use crate::core::doctor::DoctorContext;
use crate::domain::env_file::EnvFile;
use crate::domain::model::CheckOutcome;
use crate::utils::error::Result;
use crate::utils::secrets::generate_hex_token;
use async_trait::async_trait;
use std::path::Path;

pub struct EnvironmentCheck;

/// Empty values and known template strings both count as unset secrets.
pub fn is_placeholder(value: &str, placeholders: &[String]) -> bool {
    let value = value.trim();
    value.is_empty()
        || placeholders
            .iter()
            .any(|placeholder| placeholder.eq_ignore_ascii_case(value))
}

/// Secret keys present in `file` whose value still needs generating.
pub fn stale_secrets(
    file: &EnvFile,
    secret_keys: &[String],
    placeholders: &[String],
) -> Vec<String> {
    secret_keys
        .iter()
        .filter(|key| {
            file.get(key)
                .is_some_and(|value| is_placeholder(value, placeholders))
        })
        .cloned()
        .collect()
}

/// Replaces each listed key with a fresh token; other lines are untouched.
pub fn regenerate_secrets(file: &mut EnvFile, keys: &[String], token_bytes: usize) -> usize {
    keys.iter()
        .filter(|key| file.set(key, &generate_hex_token(token_bytes)))
        .count()
}

impl EnvironmentCheck {
    fn create_from_template(
        &self,
        ctx: &mut DoctorContext,
        env_path: &Path,
    ) -> Result<CheckOutcome> {
        let env_name = ctx.config.environment.file.clone();
        let template = ctx
            .config
            .environment
            .templates
            .iter()
            .find(|template| ctx.path(template).is_file())
            .cloned();

        let Some(template) = template else {
            ctx.reporter.error(&format!(
                "{} is missing and there is no template ({}) to create it from",
                env_name,
                ctx.config.environment.templates.join(", ")
            ));
            return Ok(CheckOutcome::Failed);
        };

        ctx.reporter.warn(&format!("{} is missing", env_name));
        let question = format!("Create {} from {}?", env_name, template);
        if !ctx.prompter.confirm(&question, true)? {
            ctx.reporter.hint(&format!("cp {} {}", template, env_name));
            return Ok(CheckOutcome::Failed);
        }

        let mode = ctx.config.permission_mode()?;
        std::fs::copy(ctx.path(&template), env_path)?;
        set_mode(env_path, mode)?;
        ctx.mark_fixed();
        ctx.reporter.fix(&format!("Created {} from {}", env_name, template));
        Ok(CheckOutcome::Fixed)
    }

    fn check_secrets(
        &self,
        ctx: &mut DoctorContext,
        env_path: &Path,
        file: &mut EnvFile,
    ) -> Result<CheckOutcome> {
        let env = &ctx.config.environment;
        let stale = stale_secrets(file, &env.secret_keys, &env.placeholders);
        let token_bytes = env.token_bytes;

        if stale.is_empty() {
            let present = env
                .secret_keys
                .iter()
                .filter(|key| file.contains_key(key))
                .count();
            if present > 0 {
                ctx.reporter.ok(&format!("{} secret(s) are set", present));
            }
            return Ok(CheckOutcome::Passed);
        }

        ctx.reporter.warn(&format!("Placeholder secrets: {}", stale.join(", ")));
        if !ctx.prompter.confirm("Generate new random secrets?", true)? {
            ctx.reporter.hint("Generate values with `openssl rand -hex 32`");
            return Ok(CheckOutcome::Warning);
        }

        let replaced = regenerate_secrets(file, &stale, token_bytes);
        file.save(env_path)?;
        ctx.mark_fixed();
        ctx.reporter.fix(&format!(
            "Generated {} secret(s) of {} hex characters",
            replaced,
            token_bytes * 2
        ));
        Ok(CheckOutcome::Fixed)
    }

    fn check_required(&self, ctx: &mut DoctorContext, file: &EnvFile) -> CheckOutcome {
        let missing: Vec<&str> = ctx
            .config
            .environment
            .required
            .iter()
            .filter(|key| file.get(key).map_or(true, |value| value.trim().is_empty()))
            .map(String::as_str)
            .collect();

        if missing.is_empty() {
            if !ctx.config.environment.required.is_empty() {
                ctx.reporter.ok("All required variables are set");
            }
            return CheckOutcome::Passed;
        }

        let message = format!("Required variables missing or empty: {}", missing.join(", "));
        ctx.reporter.warn(&message);
        CheckOutcome::Warning
    }

    fn check_example_keys(
        &self,
        ctx: &mut DoctorContext,
        env_path: &Path,
        file: &EnvFile,
    ) -> Result<CheckOutcome> {
        let example_name = ctx.config.environment.example.clone();
        let example_path = ctx.path(&example_name);
        if !example_path.is_file() || example_path == env_path {
            return Ok(CheckOutcome::Skipped);
        }

        let example = EnvFile::load(&example_path)?;
        let absent: Vec<&str> = example
            .keys()
            .into_iter()
            .filter(|key| !file.contains_key(key))
            .collect();

        if absent.is_empty() {
            ctx.reporter.ok(&format!("Every key in {} is defined", example_name));
            return Ok(CheckOutcome::Passed);
        }

        ctx.reporter.warn(&format!(
            "Keys in {} not defined in {}: {}",
            example_name,
            ctx.config.environment.file,
            absent.join(", ")
        ));
        ctx.reporter.hint(&format!("Copy the missing entries from {}", example_name));
        Ok(CheckOutcome::Warning)
    }
}

#[async_trait]
impl Check for EnvironmentCheck {
    fn name(&self) -> &'static str {
        "environment"
    }

    fn title(&self) -> &'static str {
        "Environment configuration"
    }

    async fn run(&self, ctx: &mut DoctorContext) -> Result<CheckOutcome> {
        let env_name = ctx.config.environment.file.clone();
        let env_path = ctx.path(&env_name);

        let mut outcome = CheckOutcome::Passed;
        if !env_path.exists() {
            outcome = self.create_from_template(ctx, &env_path)?;
            if outcome == CheckOutcome::Failed {
                return Ok(outcome);
            }
        } else {
            ctx.reporter.ok(&format!("{} exists", env_name));
        }

        let mut file = EnvFile::load(&env_path)?;
        for line in file.malformed_lines() {
            ctx.reporter.warn(&format!("{}:{} is not a KEY=value line", env_name, line));
            outcome = outcome.combine(CheckOutcome::Warning);
        }

        outcome = outcome.combine(self.check_secrets(ctx, &env_path, &mut file)?);
        outcome = outcome.combine(self.check_required(ctx, &file));
        outcome = outcome.combine(self.check_example_keys(ctx, &env_path, &file)?);
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::secrets::is_hex_token;

    fn placeholders() -> Vec<String> {
        vec!["changeme".to_string(), "your_secret_key_here".to_string()]
    }

    #[test]
    fn test_is_placeholder() {
        assert!(is_placeholder("", &placeholders()));
        assert!(is_placeholder("  ", &placeholders()));
        assert!(is_placeholder("CHANGEME", &placeholders()));
        assert!(!is_placeholder("a1b2c3", &placeholders()));
    }

    #[test]
    fn test_regenerate_only_stale_secrets() {
        let keys = vec!["SECRET_KEY_BASE".to_string(), "JWT_SECRET".to_string()];
        let mut file = EnvFile::parse(
            ".env",
            "DATABASE_URL=postgres://db\nSECRET_KEY_BASE=your_secret_key_here\nJWT_SECRET=keepme\n",
        )
        .unwrap();

        let stale = stale_secrets(&file, &keys, &placeholders());
        assert_eq!(stale, vec!["SECRET_KEY_BASE".to_string()]);

        assert_eq!(regenerate_secrets(&mut file, &stale, 32), 1);
        assert!(is_hex_token(file.get("SECRET_KEY_BASE").unwrap(), 32));
        assert_eq!(file.get("JWT_SECRET"), Some("keepme"));
        assert_eq!(file.get("DATABASE_URL"), Some("postgres://db"));
        assert!(stale_secrets(&file, &keys, &placeholders()).is_empty());
    }
}
