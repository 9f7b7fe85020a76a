pub mod config;
pub mod error;
pub mod names;

pub use config::{load_dotenv, BoardAliases, BuildServerConfig, SectionedConfig};
pub use error::ConfigError;
