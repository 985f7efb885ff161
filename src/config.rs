use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::fs;
use anyhow::{Context, Result};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub input: InputConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    /// Precomputed risk dataset, UTF-8 with BOM.
    pub risk_csv: PathBuf,
    /// Public municipal boundary GeoJSON.
    pub boundary_url: String,
    /// Local cache for the boundary document. The upstream file is static,
    /// so once written it is reused forever.
    pub boundary_cache: Option<PathBuf>,
    /// Keep only July-September rows (the summer season window).
    #[serde(default = "default_summer_only")]
    pub summer_months_only: bool,
}

fn default_summer_only() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Directory with the dashboard frontend.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config_with_defaults() {
        let toml_src = r#"
            [input]
            risk_csv = "Final_Risk_Deploy.csv"
            boundary_url = "https://example.com/skorea_municipalities_geo_simple.json"

            [server]
            port = 8080
        "#;
        let config: AppConfig = toml::from_str(toml_src).unwrap();
        assert!(config.input.summer_months_only);
        assert!(config.input.boundary_cache.is_none());
        assert_eq!(config.server.static_dir, PathBuf::from("static"));
        assert_eq!(config.server.port, 8080);
    }
}
