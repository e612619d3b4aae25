use anyhow::{bail, Context, Result};
use clap::Parser;
use pyfaq_rag::{logging, RagArgs, RagPipeline, ScoredChunk};
use tracing::warn;

#[derive(Parser, Debug)]
#[command(
    name = "pyfaq-ask",
    about = "Build the Python FAQ index and answer a single question"
)]
struct AskCli {
    /// Question to answer using the FAQ chunks
    #[arg(long)]
    query: String,

    /// Only print the retrieved context and prompt (skip the LLM call)
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    #[command(flatten)]
    rag: RagArgs,
}

fn main() -> Result<()> {
    logging::init();
    let cli = AskCli::parse();
    let question = cli.query.trim();
    if question.is_empty() {
        bail!("--query must not be empty");
    }
    let config = cli.rag.build_config().context("invalid configuration")?;
    let pipeline = RagPipeline::from_config(&config).context("failed to build the FAQ index")?;

    let hits = pipeline.retrieve(question).context("retrieval failed")?;
    if hits.is_empty() {
        warn!("index returned zero chunks; the prompt will carry an empty context");
    }
    println!("--- Retrieved Context ---\n{}", render_context(&hits));

    let prompt = pipeline.assemble(&hits, question);
    if cli.dry_run {
        println!("--- Prompt ---\n{prompt}\n");
        println!("dry-run enabled; skipping LLM call.");
        return Ok(());
    }

    let answer = pipeline.generate(&prompt).context("generation failed")?;
    println!("--- Answer ---\n{answer}");
    Ok(())
}

fn render_context(hits: &[ScoredChunk]) -> String {
    let mut out = String::new();
    for hit in hits {
        out.push_str(&format!(
            "URL: {}\nOffset: {}\nScore: {:.4}\n{}\n---\n",
            hit.chunk.metadata.source_url,
            hit.chunk.metadata.start_offset,
            hit.score,
            hit.chunk.text.trim()
        ));
    }
    out
}
