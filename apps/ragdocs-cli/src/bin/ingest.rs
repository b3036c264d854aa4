use clap::Parser;
use tracing::info;

use ragdocs_cli::{ingest, init_tracing, load_settings, IngestArgs};
use ragdocs_core::Error;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = IngestArgs::parse();
    let settings = args.apply(load_settings().map_err(|e| { eprintln!("Error loading config: {e:#}"); e })?)?;

    println!("ragdocs ingest\n==============");
    println!("PDF directory: {}", args.pdf_dir.display());
    println!("Chunking: {} tokens, {} overlap", settings.chunk_size, settings.overlap);

    let summary = match ingest(&args.pdf_dir, &settings).await {
        Ok(summary) => summary,
        Err(e) if matches!(e.downcast_ref::<Error>(), Some(Error::Empty(_))) => {
            eprintln!("{e}; index left untouched.");
            std::process::exit(1);
        }
        Err(e) => return Err(e),
    };
    info!(rows = summary.rows, dim = summary.dim, "Ingestion finished");

    println!("\n✅ Indexed {} chunks (dim {}, model {})", summary.rows, summary.dim, summary.model);
    if let Some(name) = &summary.ann_index { println!("📊 ANN index: {name}"); }
    println!("📁 Index: {}", settings.index_path.display());
    println!("📁 Metadata: {}", settings.meta_path.display());
    println!("\n💡 Ask questions with: cargo run --bin ragdocs-chat");
    Ok(())
}
