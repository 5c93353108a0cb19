use config::Config;

#[derive(serde::Deserialize, Debug, Clone)]
pub struct AppConfig {
    pub server: super::server_config::ServerConfig,
    pub sheets: super::sheets_config::SheetsConfig,
    pub pdf: super::pdf_config::PdfConfig,
    pub drive: super::drive_config::DriveConfig,
}

impl AppConfig {
    /// Reads the `Config` file in the working directory, or the file named
    /// by the `CONFIG_PATH` environment variable.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "Config".to_string());
        Config::builder()
            .add_source(config::File::with_name(&config_path))
            .build()?
            .try_deserialize()
    }
}
