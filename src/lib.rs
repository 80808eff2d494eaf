use anyhow::Context;
use log::{info, warn};
use std::sync::Arc;

pub mod services;
pub mod types;
#[cfg(test)]
pub mod test_utils;

use services::config::BotConfig;
use services::index::ExpansionIndex;
use services::pipeline::{CommentPipeline, PipelineDeps};
use services::ratings::{RatingsCache, RatingsSettings};
use services::sources::http::build_client;
use services::sources::reddit::{RedditClient, RedditCommentStream};
use services::sources::scryfall::ScryfallClient;
use services::sources::seventeen_lands::SeventeenLandsClient;

/// Load `.env`, configure logging, wire every component and watch the
/// configured subreddit until the process is stopped.
pub async fn run() -> anyhow::Result<()> {
    // A missing .env is fine; the real environment may carry everything
    let _ = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = BotConfig::from_env().context("Failed to load configuration")?;
    let http = build_client(&config.reddit.user_agent)?;

    let search = Arc::new(ScryfallClient::new(http.clone()));
    let ratings = Arc::new(RatingsCache::new(
        Arc::new(SeventeenLandsClient::new(http.clone())),
        RatingsSettings {
            format: config.engine.ratings_format.clone(),
            start_date: config.engine.ratings_start_date.clone(),
            ttl: config.engine.ratings_ttl,
        },
    ));
    let reddit = Arc::new(RedditClient::new(http, config.reddit.clone()));
    let index = Arc::new(
        ExpansionIndex::new(config.engine.index_ttl, config.engine.similarity_threshold)
            .with_retry_interval(config.engine.index_retry),
    );

    info!(
        "Building card-expansion index for {}",
        config.engine.supported_expansions.join(", ")
    );
    match index
        .refresh(search.as_ref(), &config.engine.supported_expansions)
        .await
    {
        Ok(summary) => info!(
            "Indexed {} card(s); {} expansion(s) failed",
            summary.cards,
            summary.failed_expansions.len()
        ),
        Err(e) => warn!("Initial index build failed, retrying after back-off: {e}"),
    }

    let mut pipeline = CommentPipeline::new(
        &config.engine,
        reddit.username(),
        index,
        PipelineDeps {
            search,
            ratings,
            poster: reddit.clone(),
        },
    )?;

    info!("Watching r/{} as u/{}", config.subreddit, reddit.username());
    let mut stream = RedditCommentStream::new(reddit, &config.subreddit, config.poll_interval);
    pipeline.run(&mut stream).await;

    Ok(())
}
