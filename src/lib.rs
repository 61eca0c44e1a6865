pub mod analyzer;
pub mod config;
pub mod config_loader;
pub mod domain_age;
pub mod domain_utils;
pub mod features;
pub mod normalization;
pub mod scorer;
pub mod url_resolver;

pub use analyzer::{AnalysisResult, Analyzer};
pub use config::Config;
pub use config_loader::Lists;
pub use features::Finding;
pub use scorer::Verdict;
