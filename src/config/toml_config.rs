use crate::domain::model::PortSpec;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "devenv-doctor.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DoctorConfig {
    pub docker: DockerConfig,
    pub disk: DiskConfig,
    pub resources: ResourcesConfig,
    pub ports: Vec<PortSpec>,
    pub permissions: PermissionsConfig,
    pub environment: EnvironmentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DockerConfig {
    /// Readiness polls after starting the daemon, one per interval.
    pub start_attempts: u32,
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiskConfig {
    pub min_free_gb: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourcesConfig {
    pub min_memory_gb: u64,
    pub min_cpus: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionsConfig {
    pub files: Vec<String>,
    /// Octal digits, e.g. "600".
    pub mode: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub file: String,
    /// Candidates for creating a missing env file, in preference order.
    pub templates: Vec<String>,
    /// Reference file whose keys the env file should also define.
    pub example: String,
    pub ports_file: String,
    pub secret_keys: Vec<String>,
    pub placeholders: Vec<String>,
    pub required: Vec<String>,
    pub token_bytes: usize,
}

impl Default for DoctorConfig {
    fn default() -> Self {
        Self {
            docker: DockerConfig::default(),
            disk: DiskConfig::default(),
            resources: ResourcesConfig::default(),
            ports: default_ports(),
            permissions: PermissionsConfig::default(),
            environment: EnvironmentConfig::default(),
        }
    }
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            start_attempts: 30,
            poll_interval_ms: 1000,
        }
    }
}

impl Default for DiskConfig {
    fn default() -> Self {
        Self { min_free_gb: 10 }
    }
}

impl Default for ResourcesConfig {
    fn default() -> Self {
        Self {
            min_memory_gb: 4,
            min_cpus: 2,
        }
    }
}

impl Default for PermissionsConfig {
    fn default() -> Self {
        Self {
            files: vec![
                ".env".to_string(),
                ".env.ports".to_string(),
                "credentials.json".to_string(),
            ],
            mode: "600".to_string(),
        }
    }
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            file: ".env".to_string(),
            templates: vec![".env.development".to_string(), ".env.example".to_string()],
            example: ".env.example".to_string(),
            ports_file: ".env.ports".to_string(),
            secret_keys: vec![
                "SECRET_KEY_BASE".to_string(),
                "JWT_SECRET".to_string(),
                "DEVISE_JWT_SECRET_KEY".to_string(),
                "RAILS_MASTER_KEY".to_string(),
            ],
            placeholders: vec![
                "changeme".to_string(),
                "change_me".to_string(),
                "your_secret_key_here".to_string(),
                "your_secret_key_base_here".to_string(),
                "your_jwt_secret_here".to_string(),
                "generate_with_rails_secret".to_string(),
                "development_secret".to_string(),
            ],
            required: vec![
                "DATABASE_URL".to_string(),
                "REDIS_URL".to_string(),
                "SECRET_KEY_BASE".to_string(),
            ],
            token_bytes: 32,
        }
    }
}

fn default_ports() -> Vec<PortSpec> {
    vec![
        PortSpec::new(3000, "StreamSource API", "STREAMSOURCE_PORT"),
        PortSpec::new(3001, "Livestream Monitor", "MONITOR_PORT"),
        PortSpec::new(5432, "PostgreSQL", "POSTGRES_PORT"),
        PortSpec::new(6379, "Redis", "REDIS_PORT"),
        PortSpec::new(8080, "Streamwall", "STREAMWALL_PORT"),
    ]
}

impl DoctorConfig {
    /// Loads `path` when it exists, otherwise the built-in defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            tracing::debug!("Loading configuration from {}", path.display());
            Self::from_file(path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);
        Ok(toml::from_str(&processed_content)?)
    }

    /// Replaces `${VAR}` with the variable's value; unknown names are left as-is.
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        result.to_string()
    }

    pub fn permission_mode(&self) -> Result<u32> {
        validation::parse_octal_mode("permissions.mode", &self.permissions.mode)
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_range("docker.start_attempts", self.docker.start_attempts, 1, 600)?;
        validation::validate_range(
            "docker.poll_interval_ms",
            self.docker.poll_interval_ms,
            1,
            60_000,
        )?;

        let ports: Vec<u16> = self.ports.iter().map(|spec| spec.port).collect();
        validation::validate_unique_ports("ports", &ports)?;
        for spec in &self.ports {
            validation::validate_non_empty_string("ports.service", &spec.service)?;
            validation::validate_env_key("ports.env_var", &spec.env_var)?;
        }

        for file in &self.permissions.files {
            validation::validate_path("permissions.files", file)?;
        }
        self.permission_mode()?;

        let env = &self.environment;
        validation::validate_path("environment.file", &env.file)?;
        validation::validate_path("environment.ports_file", &env.ports_file)?;
        for template in &env.templates {
            validation::validate_path("environment.templates", template)?;
        }
        for key in env.secret_keys.iter().chain(&env.required) {
            validation::validate_env_key("environment.secret_keys", key)?;
        }
        validation::validate_range("environment.token_bytes", env.token_bytes, 16, 128)?;

        Ok(())
    }
}

impl Validate for DoctorConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_are_valid() {
        let config = DoctorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.docker.start_attempts, 30);
        assert_eq!(config.permission_mode().unwrap(), 0o600);
        assert_eq!(config.environment.token_bytes, 32);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let toml_content = r#"
[disk]
min_free_gb = 20

[[ports]]
port = 4000
service = "Web"
env_var = "WEB_PORT"
"#;

        let config = DoctorConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.disk.min_free_gb, 20);
        assert_eq!(config.ports.len(), 1);
        assert_eq!(config.ports[0].port, 4000);
        assert_eq!(config.resources.min_memory_gb, 4);
        assert_eq!(config.environment.file, ".env");
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("DEVENV_DOCTOR_TEST_ENV_FILE", ".env.local");

        let toml_content = r#"
[environment]
file = "${DEVENV_DOCTOR_TEST_ENV_FILE}"
"#;

        let config = DoctorConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.environment.file, ".env.local");

        std::env::remove_var("DEVENV_DOCTOR_TEST_ENV_FILE");
    }

    #[test]
    fn test_config_validation() {
        let duplicate_ports = r#"
[[ports]]
port = 3000
service = "A"
env_var = "A_PORT"

[[ports]]
port = 3000
service = "B"
env_var = "B_PORT"
"#;
        let config = DoctorConfig::from_toml_str(duplicate_ports).unwrap();
        assert!(config.validate().is_err());

        let bad_mode = r#"
[permissions]
mode = "999"
"#;
        let config = DoctorConfig::from_toml_str(bad_mode).unwrap();
        assert!(config.validate().is_err());

        let short_token = r#"
[environment]
token_bytes = 8
"#;
        let config = DoctorConfig::from_toml_str(short_token).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[resources]\nmin_cpus = 4\n")
            .unwrap();

        let config = DoctorConfig::load_or_default(temp_file.path()).unwrap();
        assert_eq!(config.resources.min_cpus, 4);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = DoctorConfig::load_or_default(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.ports.len(), 5);
    }
}
