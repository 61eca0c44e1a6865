use crate::config::DataConfig;
use std::fs;
use std::path::Path;

/// Brand fragments used when no brand list file is available.
pub const DEFAULT_BRANDS: &[&str] = &[
    "paypal",
    "google",
    "microsoft",
    "amazon",
    "apple",
    "facebook",
    "instagram",
    "bank",
    "government",
    "hdfc",
    "sbi",
];

/// Read-only reference data shared by every analysis.
#[derive(Debug, Clone, Default)]
pub struct Lists {
    pub keywords: Vec<String>,
    pub risky_tlds: Vec<String>,
    pub registrars: Vec<String>,
    pub shorteners: Vec<String>,
    pub brands: Vec<String>,
}

impl Lists {
    pub fn load(data: &DataConfig) -> Self {
        let risky_tlds = load_list(&data.risky_tlds_file)
            .into_iter()
            .map(|tld| tld.trim_start_matches('.').to_string())
            .filter(|tld| !tld.is_empty())
            .collect();

        let mut brands = load_list(&data.brands_file);
        if brands.is_empty() {
            log::debug!("No brand list loaded, using built-in brands");
            brands = DEFAULT_BRANDS.iter().map(|b| b.to_string()).collect();
        }

        let lists = Self {
            keywords: load_list(&data.keywords_file),
            risky_tlds,
            registrars: load_list(&data.registrars_file),
            shorteners: load_list(&data.shorteners_file),
            brands,
        };

        log::info!(
            "Loaded {} keywords, {} risky TLDs, {} registrars, {} shorteners, {} brands",
            lists.keywords.len(),
            lists.risky_tlds.len(),
            lists.registrars.len(),
            lists.shorteners.len(),
            lists.brands.len()
        );

        lists
    }
}

/// Load a flat list file. Blank lines and `#` comments are skipped, entries
/// are lowercased and keep their file order. A missing file is an empty list.
pub fn load_list<P: AsRef<Path>>(path: P) -> Vec<String> {
    let path = path.as_ref();
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            log::warn!("List file {} unavailable ({e}), treating as empty", path.display());
            return Vec::new();
        }
    };

    parse_list(&content)
}

fn parse_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_lowercase)
        .collect()
}
