use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub kml: KmlConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Globs matched against paths relative to the scan root.
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub follow_links: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KmlConfig {
    #[serde(default)]
    pub title: Option<String>,
}

/// Loads `path` if given, else an optional `photo-mapper.toml` in the working
/// directory, then `PHOTO_MAPPER__SECTION__KEY` environment overrides.
pub fn load(path: Option<&str>) -> anyhow::Result<AppConfig> {
    let mut settings = config::Config::builder();
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("photo-mapper").required(false));
    }
    settings = settings.add_source(
        config::Environment::with_prefix("PHOTO_MAPPER")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("scan.exclude"),
    );
    let cfg = settings.build()?;
    Ok(cfg.try_deserialize()?)
}
