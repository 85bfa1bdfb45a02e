use anyhow::Result;

use super::{BackendServer, KvOracle};
use crate::cli::parser;
use crate::logging;

pub async fn run(args: Vec<String>) -> Result<()> {
    let config = match parser::parse_server(args) {
        Ok(config) => config,
        Err(err) => err.exit(),
    };
    logging::init(config.verbose)?;

    let oracle: KvOracle = config.records.iter().copied().collect();
    for record in &config.records {
        debug!("Record {} = {}", record.key, record.value);
    }
    BackendServer::bind(config.listen, oracle).await?.run().await
}
