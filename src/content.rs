use async_trait::async_trait;
use rand::Rng;
use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::CategorySource;
use crate::error::{EngineError, Result, Stage};

#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    pub title: String,
    pub summary: String,
    pub link: Option<String>,
    pub source_name: String,
}

#[async_trait]
pub trait ArticleSource: Send + Sync {
    async fn fetch_article(&self, category: &str) -> Result<Article>;
}

/// Picks a random entry from the category's RSS feed.
pub struct RssArticleSource {
    client: reqwest::Client,
    feeds: Vec<CategorySource>,
}

impl RssArticleSource {
    pub fn new(feeds: Vec<CategorySource>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|err| {
                EngineError::Configuration(format!("failed to build feed client: {}", err))
            })?;
        Ok(Self { client, feeds })
    }
}

#[async_trait]
impl ArticleSource for RssArticleSource {
    async fn fetch_article(&self, category: &str) -> Result<Article> {
        let feed = self
            .feeds
            .iter()
            .find(|feed| feed.name == category)
            .ok_or_else(|| {
                EngineError::unavailable(Stage::Article, format!("no feed for category '{}'", category))
            })?;

        info!("Fetching articles from {}", category);
        let bytes = self
            .client
            .get(&feed.feed_url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|err| EngineError::unavailable(Stage::Article, format!("feed request failed: {}", err)))?
            .bytes()
            .await
            .map_err(|err| EngineError::unavailable(Stage::Article, format!("feed read failed: {}", err)))?;

        let channel = rss::Channel::read_from(&bytes[..]).map_err(|err| {
            EngineError::unavailable(Stage::Article, format!("feed parse failed: {}", err))
        })?;
        if channel.items().is_empty() {
            return Err(EngineError::unavailable(
                Stage::Article,
                format!("no entries in feed for {}", category),
            ));
        }

        let index = rand::thread_rng().gen_range(0..channel.items().len());
        debug!("Picked entry {} of {} from {}", index, channel.items().len(), category);
        article_from_channel(&channel, index).ok_or_else(|| {
            EngineError::unavailable(Stage::Article, format!("entry {} has no usable text", index))
        })
    }
}

pub fn article_from_channel(channel: &rss::Channel, index: usize) -> Option<Article> {
    let item = channel.items().get(index)?;
    let title = item.title().unwrap_or_default().trim().to_string();
    let summary = item
        .description()
        .map(clean_html)
        .filter(|summary| !summary.is_empty())
        .unwrap_or_else(|| title.clone());
    if summary.is_empty() {
        return None;
    }

    Some(Article {
        title,
        summary,
        link: item.link().map(str::to_string),
        source_name: channel.title().trim().to_string(),
    })
}

pub fn clean_html(raw: &str) -> String {
    static TAGS: OnceLock<Regex> = OnceLock::new();
    let tags = TAGS.get_or_init(|| Regex::new(r"(?s)<.*?>").expect("tag pattern is valid"));
    let stripped = tags.replace_all(raw, "");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}
