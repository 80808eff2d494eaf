use super::*;
use crate::services::ratings::RatingsSettings;
use crate::test_utils::{
    comment, init_logger, rating, FakeCardSearch, FakePoster, FakeRatings, VecStream,
};
use crate::types::BotError;
use std::sync::atomic::Ordering;
use std::time::Duration;

const BOT: &str = "DraftStatsBot";

struct Harness {
    pipeline: CommentPipeline,
    search: Arc<FakeCardSearch>,
    poster: Arc<FakePoster>,
}

fn engine_config() -> EngineConfig {
    EngineConfig {
        supported_expansions: vec!["LEA".to_string()],
        reply_cooldown: Duration::ZERO,
        ..EngineConfig::default()
    }
}

fn harness_with(config: EngineConfig) -> Harness {
    init_logger();
    let search = Arc::new(FakeCardSearch::new().with_cards("LEA", &["Lightning Bolt"]));
    let ratings = Arc::new(
        FakeRatings::new().with_rows("LEA", vec![rating("Lightning Bolt", 2.5, 0.62)]),
    );
    let poster = Arc::new(FakePoster::new());

    let index = Arc::new(
        ExpansionIndex::new(config.index_ttl, config.similarity_threshold)
            .with_retry_interval(config.index_retry),
    );
    let cache = Arc::new(RatingsCache::new(
        ratings,
        RatingsSettings {
            format: config.ratings_format.clone(),
            start_date: None,
            ttl: config.ratings_ttl,
        },
    ));
    let pipeline = CommentPipeline::new(
        &config,
        BOT,
        index,
        PipelineDeps {
            search: search.clone(),
            ratings: cache,
            poster: poster.clone(),
        },
    )
    .unwrap();

    Harness {
        pipeline,
        search,
        poster,
    }
}

fn harness() -> Harness {
    harness_with(engine_config())
}

#[tokio::test]
async fn test_posts_metrics_reply() {
    let mut h = harness();

    let outcome = h
        .pipeline
        .process(&comment("c1", "alice", "How good is [[Lightning Bolt]]?"))
        .await
        .unwrap();

    assert_eq!(outcome, CommentOutcome::Posted { references: 1 });
    let posts = h.poster.posts();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].0, "c1");
    assert!(posts[0].1.contains("- ALSA: 2.50"));
    assert!(posts[0].1.contains("- GIH WR: 62.00%"));
}

#[tokio::test]
async fn test_self_authored_comment_skipped_before_anything_else() {
    let mut h = harness();

    let outcome = h
        .pipeline
        .process(&comment("c1", "draftstatsbot", "[[Lightning Bolt]]"))
        .await
        .unwrap();

    assert_eq!(outcome, CommentOutcome::SkippedSelfAuthored);
    assert_eq!(h.search.calls.load(Ordering::SeqCst), 0, "no index rebuild");
    assert!(h.poster.posts().is_empty());
}

#[tokio::test]
async fn test_comment_without_references_skipped() {
    let mut h = harness();

    let outcome = h
        .pipeline
        .process(&comment("c1", "alice", "no card names here"))
        .await
        .unwrap();

    assert_eq!(outcome, CommentOutcome::SkippedNoReferences);
    assert!(h.pipeline.guard().entry("c1").is_none(), "guard never consulted");
}

#[tokio::test]
async fn test_same_comment_is_answered_once() {
    let mut h = harness();
    let c = comment("c1", "alice", "[[Lightning Bolt]]");

    h.pipeline.process(&c).await.unwrap();
    let second = h.pipeline.process(&c).await.unwrap();

    assert_eq!(second, CommentOutcome::SkippedAlreadyReplied);
    assert_eq!(h.poster.posts().len(), 1);
}

#[tokio::test]
async fn test_existing_remote_reply_is_respected_and_remembered() {
    let mut h = harness();
    h.poster
        .existing_replies
        .lock()
        .unwrap()
        .insert("c1".to_string());

    let outcome = h
        .pipeline
        .process(&comment("c1", "alice", "[[Lightning Bolt]]"))
        .await
        .unwrap();

    assert_eq!(outcome, CommentOutcome::SkippedAlreadyReplied);
    assert!(h.poster.posts().is_empty());
    assert!(h.pipeline.guard().entry("c1").unwrap().replied);
}

#[tokio::test]
async fn test_post_failure_surfaces_and_is_not_recorded() {
    let mut h = harness();
    *h.poster.fail_posts.lock().unwrap() = true;

    let result = h
        .pipeline
        .process(&comment("c1", "alice", "[[Lightning Bolt]]"))
        .await;

    assert!(matches!(result, Err(BotError::Post(_))));
    assert!(!h.pipeline.guard().entry("c1").unwrap().replied);
}

#[tokio::test]
async fn test_index_rebuilt_lazily_once_within_ttl() {
    let mut h = harness();

    h.pipeline
        .process(&comment("c1", "alice", "[[Lightning Bolt]]"))
        .await
        .unwrap();
    let after_first = h.search.calls.load(Ordering::SeqCst);
    h.pipeline
        .process(&comment("c2", "bob", "[[Lightning Bolt]]"))
        .await
        .unwrap();

    assert_eq!(after_first, 1);
    assert_eq!(h.search.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_stale_index_rebuilt_before_next_comment() {
    let mut h = harness_with(EngineConfig {
        index_ttl: Duration::ZERO,
        ..engine_config()
    });

    h.pipeline
        .process(&comment("c1", "alice", "[[Lightning Bolt]]"))
        .await
        .unwrap();
    h.pipeline
        .process(&comment("c2", "bob", "[[Lightning Bolt]]"))
        .await
        .unwrap();

    assert_eq!(h.search.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_failed_rebuild_backs_off_between_comments() {
    let mut h = harness();
    h.search.fail_page("LEA", 0);

    for id in ["c1", "c2", "c3"] {
        h.pipeline
            .process(&comment(id, "alice", "[[Lightning Bolt]]"))
            .await
            .unwrap();
    }

    assert_eq!(h.search.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failed_rebuild_retried_once_back_off_elapses() {
    let mut h = harness_with(EngineConfig {
        index_retry: Duration::ZERO,
        ..engine_config()
    });
    h.search.fail_page("LEA", 0);

    h.pipeline
        .process(&comment("c1", "alice", "[[Lightning Bolt]]"))
        .await
        .unwrap();
    h.search.heal();
    h.pipeline
        .process(&comment("c2", "bob", "[[Lightning Bolt]]"))
        .await
        .unwrap();

    assert_eq!(h.search.calls.load(Ordering::SeqCst), 2);
    let posts = h.poster.posts();
    assert_eq!(posts[0].1, "Could not find expansions for card: Lightning Bolt\n\n");
    assert!(posts[1].1.starts_with("**Lightning Bolt** (LEA)"));
}

#[tokio::test]
async fn test_escaped_unknown_reference_gets_not_found_reply() {
    let mut h = harness();

    let outcome = h
        .pipeline
        .process(&comment("c1", "alice", r"\[\[Unknown Card\]\]"))
        .await
        .unwrap();

    assert_eq!(outcome, CommentOutcome::Posted { references: 1 });
    assert_eq!(
        h.poster.posts(),
        vec![(
            "c1".to_string(),
            "Could not find expansions for card: Unknown Card\n\n".to_string()
        )]
    );
}

#[tokio::test]
async fn test_run_survives_bad_events_and_failures() {
    let mut h = harness();
    let mut stream = VecStream::new(vec![
        Ok(comment("c1", "alice", "[[Lightning Bolt]]")),
        Err(BotError::MalformedInput("missing body".into())),
        Ok(comment("c2", BOT, "[[Lightning Bolt]]")),
        Ok(comment("c3", "bob", "nothing to see")),
        Ok(comment("c4", "carol", "[[Unknown Card]]")),
    ]);

    let stats = h.pipeline.run(&mut stream).await;

    assert_eq!(
        stats,
        PipelineStats {
            received: 5,
            posted: 2,
            skipped: 2,
            failed: 1,
        }
    );
    let posts = h.poster.posts();
    assert_eq!(posts[1].0, "c4");
    assert_eq!(posts[1].1, "Could not find expansions for card: Unknown Card\n\n");
}

#[tokio::test]
async fn test_run_continues_after_post_failure() {
    let mut h = harness();
    *h.poster.fail_posts.lock().unwrap() = true;
    let mut stream = VecStream::new(vec![
        Ok(comment("c1", "alice", "[[Lightning Bolt]]")),
        Ok(comment("c2", "bob", "[[Lightning Bolt]]")),
    ]);

    let stats = h.pipeline.run(&mut stream).await;

    assert_eq!(stats.received, 2);
    assert_eq!(stats.failed, 2);
}
