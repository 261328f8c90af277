use anyhow::Result;
use std::sync::Arc;

use crate::aggregator::Aggregator;
use crate::backend::BackendSelector;
use crate::cache::TieredCache;
use crate::config::Config;
use crate::error::AggregationError;

pub async fn run_search(
    config: &Config,
    raw_query: &str,
    backend_id: Option<&str>,
    json: bool,
) -> Result<()> {
    let selector = BackendSelector::resolve(config, backend_id);
    let cache = TieredCache::connect(&config.cache).await;
    let aggregator = Aggregator::new(config.clone(), Arc::new(cache))?;

    let channels = match aggregator.search(raw_query, &selector).await {
        Ok(channels) => channels,
        // An empty query is a no-op, not an error banner.
        Err(AggregationError::InvalidQuery) => {
            println!("No results.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&channels)?);
        return Ok(());
    }

    if channels.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, channel) in channels.iter().enumerate() {
        println!("{}. {} (@{})", i + 1, channel.name, channel.username);
        let members = if channel.members == 0 {
            "unknown".to_string()
        } else {
            channel.members.to_string()
        };
        println!(
            "    status: {}   language: {}   members: {}",
            channel.status, channel.language, members
        );
        println!(
            "    \"{}\"",
            channel.description.replace('\n', " ").trim()
        );
        println!("    last active: {}", channel.last_active);
        println!();
    }

    Ok(())
}

pub async fn run_suggest(config: &Config, raw_query: &str) -> Result<()> {
    let cache = TieredCache::connect(&config.cache).await;
    let aggregator = Aggregator::new(config.clone(), Arc::new(cache))?;

    let tags = aggregator.suggest(raw_query).await?;
    if tags.is_empty() {
        println!("No suggestions.");
        return Ok(());
    }
    for tag in tags {
        println!("{}", tag);
    }
    Ok(())
}
