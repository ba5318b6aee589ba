use std::{env, path::Path, path::PathBuf};

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;

/// `[theme]` section. Every key is optional and falls back on its own.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeSettings {
    #[serde(default, rename = "backgroundColor", alias = "backgroundcolor")]
    pub background_color: Option<String>,
    #[serde(default, rename = "textColor", alias = "textcolor")]
    pub text_color: Option<String>,
    #[serde(default)]
    pub font: Option<String>,
    #[serde(default, rename = "primaryColor", alias = "primarycolor")]
    pub primary_color: Option<String>,
}

/// `[chart]` section
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSettings {
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub preview_rows: Option<usize>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub theme: ThemeSettings,
    #[serde(default)]
    pub chart: ChartSettings,
}

lazy_static! {
    pub static ref PROJECT_NAME: String = env!("CARGO_CRATE_NAME").to_uppercase().to_string();
    pub static ref CONFIG_FILE: Option<PathBuf> =
        env::var(format!("{}_CONFIG", PROJECT_NAME.clone()))
            .ok()
            .map(PathBuf::from);
}

/// `./.smartviz/config.toml`, relative to the working directory
pub fn default_config_path() -> PathBuf {
    PathBuf::from(".")
        .join(format!(".{}", env!("CARGO_PKG_NAME")))
        .join("config.toml")
}

/// Path used when none is given: `$SMARTVIZ_CONFIG`, else the default location
pub fn get_config_path() -> PathBuf {
    CONFIG_FILE.clone().unwrap_or_else(default_config_path)
}

impl AppConfig {
    /// Load the layered configuration: the optional TOML file first, then
    /// `SMARTVIZ_`-prefixed environment variables (`SMARTVIZ_CHART__WIDTH=640`).
    ///
    /// A missing file is not an error; it is logged and the defaults apply.
    pub fn from_path(config_path: Option<&Path>) -> Result<Self> {
        let path = config_path.map(Path::to_path_buf).unwrap_or_else(get_config_path);
        if path.exists() {
            info!("Loading configuration from {}", path.display());
        } else {
            warn!("No config file at {}, using the default theme", path.display());
        }

        let builder = config::Config::builder()
            .add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                config::Environment::with_prefix(&PROJECT_NAME)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let cfg: Self = builder.build()?.try_deserialize()?;
        Ok(cfg)
    }

    /// Parse configuration from TOML text alone
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let cfg: Self = config::Config::builder()
            .add_source(config::File::from_str(text, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        Ok(cfg)
    }
}
