use clap::{Arg, ArgAction, Command};
use linkcheck::config_loader::Lists;
use linkcheck::{AnalysisResult, Analyzer, Config, Verdict};
use log::LevelFilter;
use std::process;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let matches = Command::new("linkcheck")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Heuristic phishing-risk scoring for URLs")
        .long_about(
            "LinkCheck scores a URL by running lexical, domain reputation, evasion and \
             redirect-chain checks, then re-scoring the URL the redirects lead to.",
        )
        .arg(
            Arg::new("url")
                .value_name("URL")
                .help("URL to analyze")
                .required_unless_present("generate-config"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("linkcheck.yaml"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Write a default configuration file and exit")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print the analysis result as JSON")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-redirects")
                .long("no-redirects")
                .help("Do not follow HTTP redirects")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-whois")
                .long("no-whois")
                .help("Skip WHOIS lookups (domain age is reported as unknown)")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging of every analysis phase")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .parse_default_env()
        .init();

    if let Some(generate_path) = matches.get_one::<String>("generate-config") {
        generate_default_config(generate_path);
        return;
    }

    let config_path = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or("linkcheck.yaml");
    let mut config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            process::exit(1);
        }
    };

    if matches.get_flag("no-redirects") {
        config.redirects.enabled = false;
    }
    if matches.get_flag("no-whois") {
        config.whois.enabled = false;
    }

    let Some(input_url) = matches.get_one::<String>("url") else {
        eprintln!("❌ Error: no URL given");
        process::exit(1);
    };

    let lists = Arc::new(Lists::load(&config.data));
    let analyzer = match Analyzer::from_config(&config, lists) {
        Ok(analyzer) => analyzer,
        Err(e) => {
            eprintln!("❌ Error: failed to set up analyzer: {e}");
            process::exit(1);
        }
    };

    let result = match analyzer.analyze(input_url).await {
        Ok(result) => result,
        Err(e) => {
            log::debug!("{e}");
            eprintln!("❌ Error: Invalid URL format");
            process::exit(1);
        }
    };

    if matches.get_flag("json") {
        match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("❌ Error: failed to serialize result: {e}");
                process::exit(1);
            }
        }
    } else {
        print_result(&result);
    }
}

fn load_config(path: &str) -> anyhow::Result<Config> {
    if std::path::Path::new(path).exists() {
        Config::from_file(path)
    } else {
        log::warn!("Configuration file '{path}' not found, using default configuration");
        Ok(Config::default())
    }
}

fn generate_default_config(path: &str) {
    let config = Config::default();
    match config.to_file(path) {
        Ok(()) => {
            println!("Default configuration written to: {path}");
            println!("Please edit the configuration file to suit your needs.");
        }
        Err(e) => {
            eprintln!("Error writing configuration file: {e}");
            process::exit(1);
        }
    }
}

fn verdict_icon(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Safe => "✅",
        Verdict::Suspicious => "⚠️",
        Verdict::Malicious => "🚨",
    }
}

fn print_result(result: &AnalysisResult) {
    println!("[+] Input URL      : {}", result.url);
    println!("[+] Normalized URL : {}", result.normalized_url);
    if let Some(domain) = &result.domain {
        println!("[+] Domain         : {domain}");
    }

    if result.redirect_chain.len() > 1 {
        println!();
        println!("🔀 Redirect chain ({} hops):", result.redirect_chain.len() - 1);
        for (i, hop) in result.redirect_chain.iter().enumerate() {
            println!("  {i}. {hop}");
        }
    }
    if let Some(error) = &result.redirect_error {
        println!("  (redirect expansion stopped: {error})");
    }

    println!();
    println!("Score   : {}", result.score);
    println!("Verdict : {} {}", verdict_icon(result.verdict), result.verdict);

    if !result.reasons.is_empty() {
        println!();
        println!("Reasons:");
        for reason in &result.reasons {
            println!("  • {reason}");
        }
    }
}
