#![allow(clippy::uninlined_format_args)]

use chrono::Utc;
use linkcheck::domain_age::{age_in_days, WhoisClient, WhoisLookup, WhoisMode, WhoisOutcome};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    println!("Testing REAL WHOIS lookups (not mock data)...");

    let client = WhoisClient::new(10, WhoisMode::Live);
    let now = Utc::now().naive_utc();

    let domains: Vec<String> = {
        let args: Vec<String> = std::env::args().skip(1).collect();
        if args.is_empty() {
            vec!["google.com", "example.com", "github.com", "wikipedia.org"]
                .into_iter()
                .map(String::from)
                .collect()
        } else {
            args
        }
    };

    for domain in &domains {
        println!("\n=== Testing domain: {} ===", domain);

        match client.lookup(domain).await {
            WhoisOutcome::Found(record) => {
                println!("✅ Success!");
                match record.creation_date() {
                    Some(created) => {
                        println!("  Created:   {}", created);
                        println!("  Age:       {} days", age_in_days(created, now));
                    }
                    None => println!("  Created:   (not reported)"),
                }
                println!(
                    "  Registrar: {}",
                    record.registrar.as_deref().unwrap_or("(not reported)")
                );
                if record.creation_dates.len() > 1 {
                    println!("  All creation dates: {:?}", record.creation_dates);
                }
            }
            WhoisOutcome::Failed(failure) => {
                println!("❌ Lookup failed: {}", failure);
            }
        }
    }

    Ok(())
}
