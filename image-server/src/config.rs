use std::{net::Ipv4Addr, path::PathBuf};

use serde::Deserialize;

/// Server settings, read from the process environment with `envy`.
#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(default = "default_listen_addr")]
    pub host: Ipv4Addr,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Directory imported files are staged into. When unset, records link straight to Drive.
    pub storage_dir: Option<PathBuf>,

    /// Externally visible base URL, used to build `storage_url` for staged files.
    pub public_url: Option<String>,

    pub google_api_key: Option<String>,
    #[serde(default = "default_drive_api_url")]
    pub drive_api_url: String,
}

fn default_listen_addr() -> Ipv4Addr {
    Ipv4Addr::LOCALHOST
}

fn default_port() -> u16 {
    8000
}

fn default_db_path() -> String {
    String::from("images.db")
}

fn default_drive_api_url() -> String {
    String::from(gdrive::DEFAULT_API_URL)
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let config: Config = envy::from_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Staged files are linked through `public_url()`, which must name an address clients can reach.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.storage_dir.is_some() && self.public_url.is_none() && self.host.is_unspecified() {
            anyhow::bail!(
                "PUBLIC_URL must be set when STORAGE_DIR is used and HOST is {}",
                self.host
            );
        }
        Ok(())
    }

    /// Base URL under which `/files` is reachable by clients.
    pub fn public_url(&self) -> String {
        match &self.public_url {
            Some(url) => url.trim_end_matches('/').to_owned(),
            None => format!("http://{}:{}", self.host, self.port),
        }
    }
}

#[cfg(test)]
mod test {
    use super::Config;

    #[test]
    pub fn defaults_from_empty_env() {
        let config: Config = envy::from_iter(Vec::<(String, String)>::new()).unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.db_path, "images.db");
        assert!(config.storage_dir.is_none());
        assert!(config.google_api_key.is_none());
        assert_eq!(config.drive_api_url, "https://www.googleapis.com");
        assert_eq!(config.public_url(), "http://127.0.0.1:8000");
    }

    #[test]
    pub fn overrides() {
        let config: Config = envy::from_iter(vec![
            ("PORT".to_owned(), "9001".to_owned()),
            ("STORAGE_DIR".to_owned(), "/srv/images".to_owned()),
            ("PUBLIC_URL".to_owned(), "https://img.example.com/".to_owned()),
            ("GOOGLE_API_KEY".to_owned(), "k".to_owned()),
        ])
        .unwrap();
        assert_eq!(config.port, 9001);
        assert_eq!(config.storage_dir.unwrap().to_str(), Some("/srv/images"));
        assert_eq!(config.google_api_key.as_deref(), Some("k"));
    }

    #[test]
    pub fn public_url_trims_trailing_slash() {
        let config: Config = envy::from_iter(vec![(
            "PUBLIC_URL".to_owned(),
            "https://img.example.com/".to_owned(),
        )])
        .unwrap();
        assert_eq!(config.public_url(), "https://img.example.com");
    }

    #[test]
    pub fn staging_on_wildcard_host_needs_public_url() {
        let env = |public_url: Option<&str>| {
            let mut vars = vec![
                ("HOST".to_owned(), "0.0.0.0".to_owned()),
                ("STORAGE_DIR".to_owned(), "/srv/images".to_owned()),
            ];
            if let Some(url) = public_url {
                vars.push(("PUBLIC_URL".to_owned(), url.to_owned()));
            }
            envy::from_iter::<_, Config>(vars).unwrap()
        };

        let err = env(None).validate().unwrap_err();
        assert!(err.to_string().contains("PUBLIC_URL"));

        let config = env(Some("https://img.example.com"));
        config.validate().unwrap();
        assert_eq!(config.public_url(), "https://img.example.com");

        // Linking straight to Drive never uses the server's own address
        let linked: Config =
            envy::from_iter(vec![("HOST".to_owned(), "0.0.0.0".to_owned())]).unwrap();
        linked.validate().unwrap();
    }
}
