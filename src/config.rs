use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub redirects: RedirectConfig,
    pub whois: WhoisConfig,
    pub analysis: AnalysisConfig,
}

/// Locations of the flat list files, one entry per line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub keywords_file: String,
    pub risky_tlds_file: String,
    pub registrars_file: String,
    pub shorteners_file: String,
    pub brands_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedirectConfig {
    pub enabled: bool,
    pub max_redirects: u8,
    pub timeout_seconds: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WhoisConfig {
    pub enabled: bool,
    pub timeout_seconds: u64,
    pub use_mock: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// The redirect phase only runs while the current depth is below this
    /// value, so zero disables redirect expansion and re-analysis entirely.
    pub max_recursion_depth: usize,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            keywords_file: "data/keywords.txt".to_string(),
            risky_tlds_file: "data/risky_tlds.txt".to_string(),
            registrars_file: "data/registrars.txt".to_string(),
            shorteners_file: "data/shorteners.txt".to_string(),
            brands_file: "data/brands.txt".to_string(),
        }
    }
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_redirects: 4,
            timeout_seconds: 3,
            user_agent: default_user_agent(),
        }
    }
}

impl Default for WhoisConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_seconds: 10,
            use_mock: false,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_recursion_depth: 1,
        }
    }
}

fn default_user_agent() -> String {
    format!("LinkCheck/{}", env!("CARGO_PKG_VERSION"))
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_file(&self, path: &str) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
