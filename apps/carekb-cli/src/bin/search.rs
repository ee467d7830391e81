use std::env;
use std::path::PathBuf;

use carekb_cli::{build_service, init_tracing, load_directory};
use carekb_core::config::EngineConfig;
use carekb_core::types::SearchOptions;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = EngineConfig::load()?;

    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("Usage: carekb-search <query> [--dir <corpus-dir>] [--limit N] [--threshold T]");
        eprintln!("Example: carekb-search 'chest pain' --dir ./corpus --limit 5 --threshold 0.7");
        std::process::exit(1);
    }
    let query = &args[0];
    let mut dir = PathBuf::from("./corpus");
    let mut options = SearchOptions::default();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--dir" if i + 1 < args.len() => {
                dir = PathBuf::from(&args[i + 1]);
                i += 1;
            }
            "--limit" if i + 1 < args.len() => {
                options.limit = args[i + 1].parse()?;
                i += 1;
            }
            "--threshold" if i + 1 < args.len() => {
                options.threshold = args[i + 1].parse()?;
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
    let report = service.ingest_all().await;
    if report.failed > 0 {
        eprintln!("⚠️  {} document(s) failed to ingest", report.failed);
    }

    let context = service.get_context(query, &options).await;
    println!("🔍 {} result(s) for \"{}\" in {:?}", context.total_results, query, context.took);
    println!("   {}", context.summary);
    for (i, result) in context.results.iter().enumerate() {
        println!(
            "\n  {}. score={:.4}  [{}] {}  ({})",
            i + 1,
            result.similarity,
            result.doc_type.as_str(),
            result.title,
            result.source
        );
        println!("     {}", result.content);
    }
    Ok(())
}
