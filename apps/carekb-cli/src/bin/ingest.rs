use std::env;
use std::path::PathBuf;

use indicatif::{ProgressBar, ProgressStyle};

use carekb_cli::{build_service, init_tracing, load_directory};
use carekb_core::config::EngineConfig;
use carekb_core::traits::DocumentStore as _;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = EngineConfig::load()?;

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(dir) = args.first().map(PathBuf::from) else {
        eprintln!("Usage: carekb-ingest <corpus-dir>");
        std::process::exit(1);
    };

    println!("carekb indexer\n==============");
    println!("Corpus directory: {}", dir.display());

    let (service, docs) = build_service(&config)?;
    let loaded = load_directory(&docs, &dir).await?;
    println!("Loaded {} documents", loaded);

    let active = docs.list_active().await?;
    let bar = ProgressBar::new(active.len() as u64);
    bar.set_style(ProgressStyle::with_template(
        "{bar:40.cyan/blue} {pos}/{len} {msg}",
    )?);
    let mut success = 0usize;
    let mut failed = 0usize;
    for doc in &active {
        bar.set_message(doc.title.clone());
        if service.ingest_document(&doc.id).await {
            success += 1;
        } else {
            failed += 1;
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    let status = service.index_status().await?;
    println!("\n✅ Ingestion finished: {} indexed, {} failed", success, failed);
    println!(
        "📊 Index now holds {} chunks across {} documents",
        status.total_chunks, status.indexed_documents
    );
    Ok(())
}
