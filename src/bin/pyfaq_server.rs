use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use pyfaq_rag::pipeline::{QuestionAnswerer, RagPipeline};
use pyfaq_rag::{logging, web, RagArgs};
use tokio::runtime::Builder;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "pyfaq-server",
    about = "Index the Python FAQ pages and serve a question-answering form"
)]
struct ServerCli {
    /// Address to bind the HTTP server to (host:port).
    #[arg(long, env = "PYFAQ_BIND", default_value = "127.0.0.1:8501")]
    bind: String,

    #[command(flatten)]
    rag: RagArgs,
}

fn main() -> Result<()> {
    logging::init();
    let cli = ServerCli::parse();
    let addr: SocketAddr = cli
        .bind
        .parse()
        .with_context(|| format!("invalid bind address {}", cli.bind))?;
    let config = cli.rag.build_config().context("invalid configuration")?;

    info!(pages = config.urls.len(), "building index before serving");
    let pipeline =
        Arc::new(RagPipeline::from_config(&config).context("failed to build the FAQ index")?);
    let answerer: Arc<dyn QuestionAnswerer> = pipeline.clone();

    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start tokio runtime")?;
    runtime
        .block_on(web::serve(addr, answerer))
        .with_context(|| format!("server on {addr} failed"))?;
    drop(runtime);
    // blocking HTTP clients must be dropped outside the async runtime
    drop(pipeline);
    Ok(())
}
