use serde::Deserialize;

use crate::error::AppError;
use crate::vote::types::SubmarineInfo;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub client: ClientConfig,
    pub status: StatusConfig,
    #[serde(default)]
    pub lobby: LobbyConfig,
}

#[derive(Debug, Deserialize)]
pub struct ClientConfig {
    pub server_url: String,
    pub local_client_id: u8,
    pub reconnect_max_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct StatusConfig {
    pub host: String,
    pub port: u16,
    pub token: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LobbyConfig {
    #[serde(default)]
    pub game_modes: Vec<String>,
    #[serde(default)]
    pub submarines: Vec<SubmarineInfo>,
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn from_file(path: &str) -> Result<Self, AppError> {
        let contents = std::fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }
}
