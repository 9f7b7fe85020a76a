use thiserror::Error;

/// Errors raised while reading scheduler configuration.
///
/// Missing sections and options are hard errors when explicitly queried;
/// callers decide whether a particular key is optional, never this layer.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing config section '{0}'")]
    MissingSection(String),

    #[error("missing option '{option}' in section '{section}'")]
    MissingOption { section: String, option: String },

    #[error("malformed value '{value}' for {section}.{option}: {reason}")]
    Malformed {
        section: String,
        option: String,
        value: String,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
