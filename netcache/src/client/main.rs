use std::time::Duration;

use anyhow::Result;

use super::{query, render};
use crate::cli::parser;
use crate::logging;

pub async fn run(args: Vec<String>) -> Result<()> {
    let config = match parser::parse_client(args) {
        Ok(config) => config,
        Err(err) => err.exit(),
    };
    logging::init(config.verbose)?;

    let answer = query(
        config.target,
        config.key,
        Duration::from_millis(config.timeout_ms),
    )
    .await?;
    println!("{}", render(answer));
    Ok(())
}
