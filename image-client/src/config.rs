use serde::Deserialize;

/// Client settings from `IMAGE_CLIENT_*` environment variables. Fixed for the life of the process.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

fn default_api_url() -> String {
    String::from("http://localhost:8000")
}

impl ClientConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(envy::prefixed("IMAGE_CLIENT_").from_env()?)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            api_url: default_api_url(),
        }
    }
}
