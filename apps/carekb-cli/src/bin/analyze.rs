use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use carekb_cli::{build_service, init_tracing, load_directory};
use carekb_core::config::EngineConfig;
use carekb_core::traits::WebDiscoveryProvider;
use carekb_improve::{HttpDiscoveryProvider, ImprovementEngine, QueryCategory, StaticDiscoveryProvider};

fn parse_category(value: &str) -> anyhow::Result<QueryCategory> {
    Ok(match value {
        "emergency" => QueryCategory::Emergency,
        "specialist" => QueryCategory::Specialist,
        "mental_health" => QueryCategory::MentalHealth,
        "routine" => QueryCategory::Routine,
        "general" => QueryCategory::General,
        other => anyhow::bail!("unknown category: {}", other),
    })
}

/// An HTTP discovery provider when `CAREKB_DISCOVERY_ENDPOINT` is set,
/// otherwise an empty canned provider so analysis stays offline.
fn discovery_provider() -> anyhow::Result<Arc<dyn WebDiscoveryProvider>> {
    match env::var("CAREKB_DISCOVERY_ENDPOINT") {
        Ok(endpoint) => Ok(Arc::new(HttpDiscoveryProvider::new(
            &endpoint,
            env::var("CAREKB_DISCOVERY_API_KEY").ok(),
        )?)),
        Err(_) => Ok(Arc::new(StaticDiscoveryProvider::default())),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = EngineConfig::load()?;

    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("Usage: carekb-analyze <query> [--dir <corpus-dir>] [--category <name>]");
        std::process::exit(1);
    }
    let query = &args[0];
    let mut dir = PathBuf::from("./corpus");
    let mut category = QueryCategory::General;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--dir" if i + 1 < args.len() => {
                dir = PathBuf::from(&args[i + 1]);
                i += 1;
            }
            "--category" if i + 1 < args.len() => {
                category = parse_category(&args[i + 1])?;
                i += 1;
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let (service, docs) = build_service(&config)?;
    load_directory(&docs, &dir).await?;
    service.ingest_all().await;

    let engine = ImprovementEngine::new(service, docs, discovery_provider()?);
    let report = engine.analyze(query, category).await;

    println!("Analysis for \"{}\" ({})", query, category.as_str());
    println!("\nKnowledge gaps: {}", report.gaps.len());
    for gap in &report.gaps {
        println!("  - [{:?}] {}", gap.priority, gap.description);
        println!("    → {}", gap.suggested_action);
    }
    println!("\nDiscovered resources: {}", report.discovered_resources.len());
    for resource in &report.discovered_resources {
        println!(
            "  - {:.2} [{:?}] {} <{}>{}",
            resource.relevance,
            resource.quality,
            resource.title,
            resource.url,
            if resource.auto_ingestible { "  (auto-ingested)" } else { "" }
        );
    }
    println!("\nRecommendations: {}", report.recommendations.len());
    for rec in &report.recommendations {
        println!("  - {}", rec);
    }
    Ok(())
}
