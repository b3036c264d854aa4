use std::io::Write;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

use ragdocs_cli::{init_tracing, load_settings, preview};
use ragdocs_qa::Rag;

const SOURCE_PREVIEW_CHARS: usize = 300;

/// Ask questions about the ingested documents from the terminal.
#[derive(Debug, Parser)]
#[command(name = "ragdocs-chat", version)]
struct ChatArgs {
    /// Generate answers with the configured LLM instead of returning raw context
    #[arg(long)]
    use_llm: bool,

    /// Chunks retrieved per question
    #[arg(long)]
    top_k: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = ChatArgs::parse();
    let settings = load_settings()?;
    let top_k = args.top_k.unwrap_or(settings.default_top_k);
    let rag = Rag::from_settings(&settings).await?;
    if args.use_llm && !rag.can_generate() {
        warn!("--use-llm given but no OpenAI API key is configured; answers will be raw context");
    }
    println!("💬 ragdocs chat\n==============");
    if rag.retriever().is_loaded() {
        println!("✅ Index loaded: {} chunks", rag.retriever().len());
    } else {
        println!("⚠️  No index found at {}; run ragdocs-ingest first.", settings.index_path.display());
    }

    println!("Ask a question about your PDFs (\"quit\" to leave).");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("\n> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else { break };
        let question = line.trim();
        if question.is_empty() { continue; }
        if matches!(question, "quit" | "exit") { break; }

        match rag.answer(question, top_k, args.use_llm).await {
            Ok(resp) => {
                println!("\n{}", resp.answer);
                if !resp.sources.is_empty() {
                    println!("\nSources:");
                    for s in &resp.sources {
                        println!("- {} (score: {:.3})\n{}...", s.source, s.score, preview(&s.text, SOURCE_PREVIEW_CHARS));
                    }
                }
            }
            Err(e) => eprintln!("Error: {e}"),
        }
    }
    Ok(())
}
