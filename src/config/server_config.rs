#[derive(serde::Deserialize, Debug, Clone)]
pub struct ServerConfig {
    pub host: Box<str>,
    pub port: u16,
}
