//! Entry point for the `tanzu` binary.

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let code = tanzu_cli::run().await?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
