//! Ambient configuration: a `figment` layering of a base TOML file, a
//! git-ignored local-override TOML file, and prefixed environment
//! variables, all extracted into a `serde`-derived struct tree covering
//! run behavior and logging.

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Default evaluation behavior, consulted when a CLI invocation or REPL
/// session doesn't say otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Default number of timesteps `run` advances when none is given.
    #[serde(default = "default_timesteps")]
    pub default_timesteps: u64,

    /// Inclusive bounds of the default `randint` source. Must stay `>= 1`.
    #[serde(default = "default_randint_low")]
    pub randint_low: u64,
    #[serde(default = "default_randint_high")]
    pub randint_high: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_timesteps() -> u64 {
    10
}
fn default_randint_low() -> u64 {
    1
}
fn default_randint_high() -> u64 {
    10
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "text".to_string()
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            default_timesteps: default_timesteps(),
            randint_low: default_randint_low(),
            randint_high: default_randint_high(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig { level: default_log_level(), format: default_log_format() }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config { run: RunConfig::default(), logging: LoggingConfig::default() }
    }
}

impl Config {
    /// Merges `dedalus.toml` (base), `dedalus.local.toml` (git-ignored
    /// overrides), and `DEDALUS_`-prefixed environment variables, in that
    /// order, falling back to [`Config::default`] fields for anything
    /// unset.
    pub fn load() -> Result<Self, figment::Error> {
        Figment::from(figment::providers::Serialized::defaults(Config::default()))
            .merge(Toml::file("dedalus.toml"))
            .merge(Toml::file("dedalus.local.toml"))
            .merge(Env::prefixed("DEDALUS_").split("__"))
            .extract()
    }
}
