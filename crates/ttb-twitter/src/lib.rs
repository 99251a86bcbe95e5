//! Twitter API v2 adapter (share-to-social).
//!
//! Implements the `ttb-core` `SocialPort` over `POST /2/tweets` with
//! bearer-token auth. Long texts become a reply-chained thread.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use ttb_core::{
    errors::Error,
    formatting::split_chunks,
    ports::{ShareReceipt, SocialPort},
    Result,
};

const API_URL: &str = "https://api.twitter.com/2/tweets";

/// Conservative per-tweet budget, leaving headroom for the thread marker.
pub const TWEET_MAX_CHARS: usize = 270;

#[derive(Clone, Debug)]
pub struct TwitterClient {
    bearer_token: String,
    http: reqwest::Client,
}

impl TwitterClient {
    pub fn new(bearer_token: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .expect("reqwest client build");
        Self {
            bearer_token: bearer_token.into(),
            http,
        }
    }

    async fn create_tweet(&self, text: String, in_reply_to: Option<&str>) -> Result<String> {
        let body = tweet_request(text, in_reply_to);

        let resp = self
            .http
            .post(API_URL)
            .bearer_auth(&self.bearer_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("twitter request error: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Upstream(format!(
                "twitter returned {status}: {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let parsed: TweetResponse = resp
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("twitter response decode error: {e}")))?;

        debug!(tweet_id = %parsed.data.id, "tweet created");
        Ok(parsed.data.id)
    }
}

#[async_trait]
impl SocialPort for TwitterClient {
    async fn post(&self, text: &str) -> Result<ShareReceipt> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::Validation("nothing to post".to_string()));
        }

        let chunks = split_chunks(text, TWEET_MAX_CHARS);
        if chunks.len() == 1 {
            self.create_tweet(chunks[0].clone(), None).await?;
            return Ok(ShareReceipt {
                posts: 1,
                thread: false,
            });
        }

        // Thread: first tweet gets the marker, the rest reply in a chain.
        let mut last_id = self
            .create_tweet(format!("{} 🧵", chunks[0]), None)
            .await?;
        for chunk in &chunks[1..] {
            last_id = self.create_tweet(chunk.clone(), Some(&last_id)).await?;
        }

        Ok(ShareReceipt {
            posts: chunks.len(),
            thread: true,
        })
    }
}

fn tweet_request(text: String, in_reply_to: Option<&str>) -> TweetRequest<'_> {
    TweetRequest {
        text,
        reply: in_reply_to.map(|id| TweetReply {
            in_reply_to_tweet_id: id,
        }),
    }
}

#[derive(Serialize)]
struct TweetRequest<'a> {
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply: Option<TweetReply<'a>>,
}

#[derive(Serialize)]
struct TweetReply<'a> {
    in_reply_to_tweet_id: &'a str,
}

#[derive(Deserialize)]
struct TweetResponse {
    data: TweetData,
}

#[derive(Deserialize)]
struct TweetData {
    id: String,
}
