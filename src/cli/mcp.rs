use anyhow::Result;

use crate::cli::Paths;

pub async fn run(paths: &Paths) -> Result<()> {
    let workspace = paths.open()?;
    crate::mcp::serve(workspace).await
}
