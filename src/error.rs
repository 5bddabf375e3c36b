use thiserror::Error;

#[derive(Error, Debug)]
pub enum ZapError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Usage error: {message}")]
    Usage { message: String },

    #[error("Startup error: {message}")]
    Startup { message: String },

    #[error("System error: {message}")]
    System { message: String },
}

impl ZapError {
    pub fn usage<S: Into<String>>(message: S) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }

    pub fn startup<S: Into<String>>(message: S) -> Self {
        Self::Startup {
            message: message.into(),
        }
    }

    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ZapError>;
