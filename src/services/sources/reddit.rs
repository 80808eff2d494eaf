//! Reddit transport: OAuth script-app login, a polling comment stream and the
//! reply endpoint.

use async_trait::async_trait;
use log::{debug, info, warn};
use lru::LruCache;
use reqwest::{header, Client, Url};
use serde::Deserialize;
use serde_json::Value;
use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::http::{form_body, send_checked};
use super::{CommentStream, ReplyPoster};
use crate::services::config::RedditCredentials;
use crate::types::{BotError, BotResult, IncomingComment};

const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const API_BASE: &str = "https://oauth.reddit.com";

/// Refresh the bearer token this long before Reddit says it expires.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// How many comment ids the stream remembers to avoid yielding one twice.
const SEEN_CAPACITY: usize = 2_000;

const LISTING_LIMIT: &str = "100";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
    error: Option<String>,
}

struct AccessToken {
    value: String,
    expires_at: Instant,
}

#[derive(Debug, Deserialize)]
struct CommentData {
    id: String,
    author: Option<String>,
    body: String,
    link_id: String,
}

/// Authenticated Reddit API client. Shared by the stream and the poster.
pub struct RedditClient {
    http: Client,
    credentials: RedditCredentials,
    token: Mutex<Option<AccessToken>>,
}

impl RedditClient {
    pub fn new(http: Client, credentials: RedditCredentials) -> Self {
        Self {
            http,
            credentials,
            token: Mutex::new(None),
        }
    }

    pub fn username(&self) -> &str {
        &self.credentials.username
    }

    async fn bearer(&self) -> BotResult<String> {
        let mut token = self.token.lock().await;
        if let Some(current) = token.as_ref() {
            if Instant::now() < current.expires_at {
                return Ok(current.value.clone());
            }
        }

        let fresh = self.request_token().await?;
        let value = fresh.value.clone();
        *token = Some(fresh);
        Ok(value)
    }

    async fn request_token(&self) -> BotResult<AccessToken> {
        let creds = &self.credentials;
        let body = form_body(&[
            ("grant_type", "password"),
            ("username", creds.username.as_str()),
            ("password", creds.password.as_str()),
        ]);

        let response = send_checked(|| {
            self.http
                .post(TOKEN_URL)
                .basic_auth(&creds.client_id, Some(&creds.client_secret))
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(body.clone())
        })
        .await
        .map_err(|e| BotError::Fetch(format!("Reddit login: {e}")))?;

        let parsed: TokenResponse = response.json().await?;
        if let Some(error) = parsed.error {
            return Err(BotError::Fetch(format!("Reddit login rejected: {error}")));
        }
        let value = parsed
            .access_token
            .ok_or_else(|| BotError::MalformedInput("token response without access_token".into()))?;
        let lifetime = Duration::from_secs(parsed.expires_in.unwrap_or(3600));

        info!("Authenticated with Reddit as u/{}", creds.username);
        Ok(AccessToken {
            value,
            expires_at: Instant::now() + lifetime.saturating_sub(TOKEN_EXPIRY_MARGIN),
        })
    }

    async fn get_json(&self, url: Url) -> BotResult<Value> {
        let bearer = self.bearer().await?;
        let response = send_checked(|| self.http.get(url.clone()).bearer_auth(&bearer))
            .await
            .map_err(|e| BotError::Fetch(format!("GET {}: {e}", url.path())))?;
        Ok(response.json().await?)
    }

    /// Newest-first page of the subreddit's comment feed.
    async fn latest_comments(
        &self,
        subreddit: &str,
    ) -> BotResult<Vec<BotResult<IncomingComment>>> {
        let url = api_url(
            &format!("/r/{subreddit}/comments"),
            &[("limit", LISTING_LIMIT), ("raw_json", "1")],
        )?;
        let listing = self.get_json(url).await?;
        parse_comment_listing(&listing)
    }
}

#[async_trait]
impl ReplyPoster for RedditClient {
    async fn has_self_reply(&self, comment: &IncomingComment) -> BotResult<bool> {
        let link = comment.link_id.trim_start_matches("t3_");
        let url = api_url(
            &format!("/comments/{link}"),
            &[
                ("comment", comment.id.as_str()),
                ("depth", "2"),
                ("limit", LISTING_LIMIT),
                ("raw_json", "1"),
            ],
        )?;
        let thread = self.get_json(url).await?;
        let me = self.username();
        Ok(reply_authors(&thread)
            .iter()
            .any(|author| author.eq_ignore_ascii_case(me)))
    }

    async fn post_reply(&self, comment: &IncomingComment, body: &str) -> BotResult<()> {
        let bearer = self.bearer().await?;
        let thing_id = format!("t1_{}", comment.id);
        let form = form_body(&[
            ("api_type", "json"),
            ("thing_id", thing_id.as_str()),
            ("text", body),
        ]);

        let response = send_checked(|| {
            self.http
                .post(format!("{API_BASE}/api/comment"))
                .bearer_auth(&bearer)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(form.clone())
        })
        .await
        .map_err(|e| BotError::Post(e.to_string()))?;

        let payload: Value = response
            .json()
            .await
            .map_err(|e| BotError::Post(format!("unreadable response: {e}")))?;
        match post_errors(&payload) {
            errors if errors.is_empty() => Ok(()),
            errors => Err(BotError::Post(errors.join("; "))),
        }
    }
}

/// Polls the subreddit feed and yields unseen comments oldest-first.
pub struct RedditCommentStream {
    client: Arc<RedditClient>,
    subreddit: String,
    poll_interval: Duration,
    pending: VecDeque<IncomingComment>,
    seen: LruCache<String, ()>,
}

impl RedditCommentStream {
    pub fn new(client: Arc<RedditClient>, subreddit: &str, poll_interval: Duration) -> Self {
        Self {
            client,
            subreddit: subreddit.to_string(),
            poll_interval,
            pending: VecDeque::new(),
            seen: LruCache::new(NonZeroUsize::new(SEEN_CAPACITY).unwrap_or(NonZeroUsize::MIN)),
        }
    }

    /// Queue the unseen part of a newest-first batch. Returns how many were queued.
    ///
    /// Undecodable comments are skipped here; they have no id to remember, so
    /// they would otherwise come back on every poll.
    fn enqueue_batch(&mut self, batch: Vec<BotResult<IncomingComment>>) -> usize {
        let before = self.pending.len();
        for item in batch.into_iter().rev() {
            match item {
                Ok(comment) => {
                    if self.seen.put(comment.id.clone(), ()).is_none() {
                        self.pending.push_back(comment);
                    }
                }
                Err(e) => warn!("Skipping comment in r/{}: {e}", self.subreddit),
            }
        }
        self.pending.len() - before
    }
}

#[async_trait]
impl CommentStream for RedditCommentStream {
    async fn next_comment(&mut self) -> Option<BotResult<IncomingComment>> {
        loop {
            if let Some(comment) = self.pending.pop_front() {
                return Some(Ok(comment));
            }

            match self.client.latest_comments(&self.subreddit).await {
                Ok(batch) => {
                    let queued = self.enqueue_batch(batch);
                    debug!("r/{}: {} new comment(s)", self.subreddit, queued);
                    if queued == 0 {
                        tokio::time::sleep(self.poll_interval).await;
                    }
                }
                Err(e) => {
                    warn!("Comment poll failed for r/{}: {e}", self.subreddit);
                    tokio::time::sleep(self.poll_interval).await;
                    return Some(Err(e));
                }
            }
        }
    }
}

fn api_url(path: &str, params: &[(&str, &str)]) -> BotResult<Url> {
    Url::parse_with_params(&format!("{API_BASE}{path}"), params)
        .map_err(|e| BotError::Fetch(format!("Invalid Reddit URL: {e}")))
}

/// Decode a `Listing` of `t1` things. Undecodable children become
/// `MalformedInput` items instead of failing the whole batch.
fn parse_comment_listing(listing: &Value) -> BotResult<Vec<BotResult<IncomingComment>>> {
    let children = listing["data"]["children"]
        .as_array()
        .ok_or_else(|| BotError::MalformedInput("listing without data.children".into()))?;

    Ok(children
        .iter()
        .filter(|child| child["kind"] == "t1")
        .map(|child| -> BotResult<IncomingComment> {
            let data: CommentData = serde_json::from_value(child["data"].clone())?;
            let author = data.author.filter(|a| a != "[deleted]");
            Ok(IncomingComment {
                id: data.id,
                author,
                body: data.body,
                link_id: data.link_id,
            })
        })
        .collect())
}

/// Authors of the direct replies to the focused comment in a
/// `/comments/{link}?comment={id}` response.
fn reply_authors(thread: &Value) -> Vec<String> {
    let focused = &thread[1]["data"]["children"][0]["data"];
    // `replies` is an empty string when there are none
    let Some(replies) = focused["replies"]["data"]["children"].as_array() else {
        return Vec::new();
    };

    replies
        .iter()
        .filter(|reply| reply["kind"] == "t1")
        .filter_map(|reply| reply["data"]["author"].as_str())
        .map(str::to_string)
        .collect()
}

fn post_errors(payload: &Value) -> Vec<String> {
    payload["json"]["errors"]
        .as_array()
        .map(|errors| {
            errors
                .iter()
                .map(|error| match error.as_array() {
                    Some(parts) => parts
                        .iter()
                        .filter_map(Value::as_str)
                        .collect::<Vec<_>>()
                        .join(": "),
                    None => error.to_string(),
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "tests/reddit_tests.rs"]
mod tests;
