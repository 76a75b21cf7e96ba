use serde::{Deserialize, Serialize};

/// CLI configuration, read from `VANISH_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Where the web viewer lives, if not on the API host.
    #[serde(default)]
    pub web_url: Option<String>,
}

impl Config {
    /// Absolute link a recipient can open, from the server's relative `/view/{uuid}`.
    pub fn share_url(&self, path: &str) -> String {
        let base = self.web_url.as_deref().unwrap_or(&self.api_url);
        format!("{}{}", base.trim_end_matches('/'), path)
    }
}

fn default_api_url() -> String {
    "http://localhost:3001".into()
}
