use std::sync::Arc;

use anyhow::{Context, Result};

use crate::cache::{LearnedCache, StaticRuleCache};
use crate::cli::assignment::{load_rules_file, Assignment};
use crate::cli::parser::{self, NetcacheArgs};
use crate::logging;
use crate::pipeline::Dispatcher;
use crate::server::device::{Device, DeviceConfig};
use crate::server::runtime_builder;

#[cfg(feature = "jemallocator")]
use jemallocator::Jemalloc;

#[cfg(feature = "jemallocator")]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

/// Rules from the rules file first, then `--rule` arguments, so the command
/// line overrides the file for the same key.
pub fn install_static_rules(config: &NetcacheArgs) -> Result<StaticRuleCache> {
    let mut rules: Vec<Assignment> = Vec::new();
    if let Some(path) = &config.rules_file {
        rules.extend(load_rules_file(path)?);
    }
    rules.extend(config.rules.iter().copied());

    let cache = StaticRuleCache::new();
    for rule in rules {
        match cache.insert(rule.key, rule.value) {
            Some(previous) => info!(
                "Static rule {} = {} (overrides {})",
                rule.key, rule.value, previous
            ),
            None => debug!("Static rule {} = {}", rule.key, rule.value),
        }
    }
    Ok(cache)
}

async fn serve(config: DeviceConfig, dispatcher: Arc<Dispatcher>) -> Result<()> {
    let device = Device::bind(&config, dispatcher).await?;
    tokio::select! {
        res = device.run() => res,
        res = tokio::signal::ctrl_c() => {
            res.context("Failed to listen for shutdown signal")?;
            info!("Shutting down");
            Ok(())
        }
    }
}

pub fn run(args: Vec<String>) -> Result<()> {
    let cli_config = match parser::parse(args) {
        Ok(config) => config,
        Err(err) => err.exit(),
    };
    logging::init(cli_config.verbose)?;

    info!("Listen address: {}", cli_config.listen);
    info!("Backend server: {}", cli_config.server);
    info!("Upstream bind address: {}", cli_config.upstream_bind);
    info!("Learned cache slots: {}", cli_config.slots);
    info!("Number of threads: {}", cli_config.threads);

    let static_rules = Arc::new(install_static_rules(&cli_config)?);
    info!("Static rules installed: {}", static_rules.len());
    let learned = Arc::new(LearnedCache::new(cli_config.slots)?);
    let dispatcher = Arc::new(Dispatcher::new(static_rules, learned));

    let device_config = DeviceConfig::from(&cli_config);
    let runtime = runtime_builder::create_runtime(cli_config.threads)?;
    let result = runtime.block_on(serve(device_config, dispatcher.clone()));

    info!(
        "Learned slots occupied: {}/{}",
        dispatcher.learned().occupied(),
        dispatcher.learned().capacity()
    );
    info!("{}", dispatcher.stats().snapshot());
    result
}
