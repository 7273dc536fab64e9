use anyhow::Result;
use confer::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
