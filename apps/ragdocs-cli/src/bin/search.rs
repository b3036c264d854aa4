use clap::Parser;

use ragdocs_cli::{init_tracing, load_settings};
use ragdocs_embed::get_default_embedder;
use ragdocs_qa::Retriever;

/// Show the chunks retrieved for a query, without answer assembly.
#[derive(Debug, Parser)]
#[command(name = "ragdocs-search", version)]
struct SearchArgs {
    query: String,

    #[arg(long, default_value_t = 10)]
    limit: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = SearchArgs::parse();
    let settings = load_settings()?;
    println!("🔍 ragdocs-search\n================");
    println!("Query: {}", args.query);
    println!("Index: {}", settings.index_path.display());

    let retriever = Retriever::from_settings(&settings, get_default_embedder(&settings)?).await?;
    let results = retriever.retrieve(&args.query, args.limit).await?;
    println!("\n🔍 Found {} results for: \"{}\"", results.len(), args.query);
    for (i, r) in results.iter().enumerate() {
        println!("\n  {}. score={:.4}  source={}", i + 1, r.score, r.source);
        println!("     📝 Content: {}", r.text);
    }
    Ok(())
}
