//! The `juicetrace` binary.

use clap::Parser;
use juicetrace_cli::{CliArgs, JuiceTraceCli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let cli = JuiceTraceCli::from_args("juicetrace", &args)?;
    cli.run(args).await?;
    Ok(())
}
