//! 17Lands card ratings export.

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Url};

use super::http::send_checked;
use super::{RatingRow, RatingsQuery, RatingsSource};
use crate::types::{BotError, BotResult};

const RATINGS_URL: &str = "https://www.17lands.com/card_ratings/data";

pub struct SeventeenLandsClient {
    client: Client,
}

impl SeventeenLandsClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn ratings_url(query: &RatingsQuery) -> BotResult<Url> {
        let mut params = vec![
            ("expansion", query.expansion.as_str()),
            ("format", query.format.as_str()),
        ];
        if let Some(start) = &query.start_date {
            params.push(("start_date", start.as_str()));
        }
        Url::parse_with_params(RATINGS_URL, &params)
            .map_err(|e| BotError::Fetch(format!("Invalid ratings URL: {e}")))
    }
}

#[async_trait]
impl RatingsSource for SeventeenLandsClient {
    async fn fetch_ratings(&self, query: &RatingsQuery) -> BotResult<Vec<RatingRow>> {
        let url = Self::ratings_url(query)?;
        debug!("17Lands ratings: {}", url);

        let response = send_checked(|| self.client.get(url.clone()))
            .await
            .map_err(|e| BotError::Fetch(format!("17Lands ratings for {}: {e}", query.expansion)))?;

        let body = response.text().await?;
        let rows: Vec<RatingRow> = serde_json::from_str(&body)?;
        Ok(rows)
    }
}
