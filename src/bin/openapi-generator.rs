//! Print the scoreboard-back OpenAPI document as pretty JSON on stdout.

use anyhow::Context;
use scoreboard_back::services::documentation::ApiDoc;
use utoipa::OpenApi;

fn main() -> anyhow::Result<()> {
    let json = ApiDoc::openapi()
        .to_pretty_json()
        .context("serializing OpenAPI document")?;
    println!("{json}");
    Ok(())
}
