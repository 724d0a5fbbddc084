use thiserror::Error;

#[derive(Error, Debug)]
pub enum DoctorError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Command `{program}` failed: {message}")]
    CommandError { program: String, message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("{path}:{line}: {message}")]
    EnvFileError {
        path: String,
        line: usize,
        message: String,
    },

    #[error("Prompt failed: {message}")]
    PromptError { message: String },
}

impl DoctorError {
    pub fn command(program: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CommandError {
            program: program.into(),
            message: message.into(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::IoError(_) => "Check that the project directory exists and is writable",
            Self::SerializationError(_) => "Make sure the Docker CLI matches the daemon version",
            Self::TomlError(_) | Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => {
                "Fix the configuration file or remove it to use the built-in defaults"
            }
            Self::CommandError { .. } => "Run the command by hand to see its full output",
            Self::EnvFileError { .. } => "Fix the offending line in the environment file",
            Self::PromptError { .. } => "Re-run with --yes or --no-fix when stdin is not a terminal",
        }
    }
}

pub type Result<T> = std::result::Result<T, DoctorError>;
