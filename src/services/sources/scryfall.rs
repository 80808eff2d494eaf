//! Scryfall card search, used to learn which expansions print a card.

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Url};
use std::time::Duration;

use super::http::send_checked;
use super::{CardSearchPage, CardSearchSource};
use crate::types::{BotError, BotResult};

const SEARCH_URL: &str = "https://api.scryfall.com/cards/search";

/// Scryfall asks clients to keep 50–100 ms between requests.
const PAGE_DELAY: Duration = Duration::from_millis(100);

pub struct ScryfallClient {
    client: Client,
}

impl ScryfallClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn first_page_url(expansion: &str) -> BotResult<Url> {
        let query = format!("e:{}", expansion.to_lowercase());
        Url::parse_with_params(
            SEARCH_URL,
            &[("order", "set"), ("q", query.as_str()), ("unique", "cards")],
        )
        .map_err(|e| BotError::Fetch(format!("Invalid search URL: {e}")))
    }
}

#[async_trait]
impl CardSearchSource for ScryfallClient {
    async fn search_page(
        &self,
        expansion: &str,
        page_token: Option<&str>,
    ) -> BotResult<CardSearchPage> {
        let url = match page_token {
            Some(next) => {
                tokio::time::sleep(PAGE_DELAY).await;
                Url::parse(next).map_err(|e| BotError::Fetch(format!("Invalid next_page: {e}")))?
            }
            None => Self::first_page_url(expansion)?,
        };

        debug!("Scryfall search: {}", url);
        let response = send_checked(|| {
            self.client
                .get(url.clone())
                .header(reqwest::header::ACCEPT, "application/json")
        })
        .await
        .map_err(|e| BotError::Fetch(format!("Scryfall search for {expansion}: {e}")))?;

        let page: CardSearchPage = response.json().await?;
        Ok(page)
    }
}
