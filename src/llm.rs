use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use tracing::debug;

use crate::error::{EngineError, Result, Stage};

const ARTICLE_CHAR_LIMIT: usize = 2000;

/// The two-part script of a reel.
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    pub hook: String,
    pub revelation: String,
}

#[async_trait]
pub trait ScriptWriter: Send + Sync {
    async fn generate_script(&self, article_text: &str, style_prompt: &str) -> Result<Script>;

    async fn generate_caption(
        &self,
        script: &Script,
        source_name: &str,
        credit: Option<&str>,
    ) -> Result<String>;

    async fn generate_hashtags(&self, topic: &str) -> Result<Vec<String>>;
}

#[derive(Clone)]
pub struct OpenRouterWriter {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
    site_url: String,
    site_name: String,
}

impl OpenRouterWriter {
    pub fn from_env(model_override: Option<String>) -> Result<Self> {
        let api_key = env::var("OPENROUTER_API_KEY").unwrap_or_default();
        if !api_key.contains("sk-or-v1") {
            return Err(EngineError::Configuration(
                "OPENROUTER_API_KEY is missing or invalid".to_string(),
            ));
        }
        let api_base = env::var("OPENROUTER_API_BASE")
            .unwrap_or_else(|_| "https://openrouter.ai/api/v1".to_string());
        let model = model_override
            .or_else(|| env::var("OPENROUTER_MODEL").ok())
            .unwrap_or_else(|| "deepseek/deepseek-chat-v3-0324:free".to_string());
        let site_url =
            env::var("OPENROUTER_SITE_URL").unwrap_or_else(|_| "https://nextgensignals.ai".to_string());
        let site_name =
            env::var("OPENROUTER_SITE_NAME").unwrap_or_else(|_| "NextGen Signals".to_string());
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| EngineError::Configuration(format!("failed to build model client: {}", err)))?;

        Ok(Self {
            client,
            api_key,
            api_base,
            model,
            site_url,
            site_name,
        })
    }

    async fn complete(&self, stage: Stage, messages: Vec<ChatMessage>, max_tokens: u32) -> Result<String> {
        let url = format!("{}/chat/completions", self.api_base.trim_end_matches('/'));
        let request = ChatRequest {
            model: self.model.clone(),
            messages,
            max_tokens,
            temperature: 0.7,
        };

        let response = self
            .client
            .post(url)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header("HTTP-Referer", &self.site_url)
            .header("X-Title", &self.site_name)
            .json(&request)
            .send()
            .await
            .map_err(|err| EngineError::unavailable(stage, format!("model request failed: {}", err)))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let detail = error_body.trim();
            if detail.is_empty() {
                return Err(EngineError::unavailable(stage, format!("model API error: {}", status)));
            }
            return Err(EngineError::unavailable(
                stage,
                format!("model API error: {} {}", status, detail),
            ));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|err| EngineError::unavailable(stage, format!("model response parse failed: {}", err)))?;

        let content = body
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
            .map(str::trim)
            .unwrap_or_default()
            .to_string();
        if content.is_empty() {
            return Err(EngineError::unavailable(stage, "model returned no content"));
        }
        debug!("Model reply for {}: {} chars", stage, content.len());
        Ok(content)
    }
}

#[async_trait]
impl ScriptWriter for OpenRouterWriter {
    async fn generate_script(&self, article_text: &str, style_prompt: &str) -> Result<Script> {
        let article: String = article_text.chars().take(ARTICLE_CHAR_LIMIT).collect();
        let messages = vec![
            ChatMessage::system(
                "You are a creative director for a tech-focused social media channel. Your goal is to create short, compelling video scripts from complex articles. Respond with only the Hook and the Revelation, separated by '|||'.",
            ),
            ChatMessage::user(format!(
                "Article: \"{}\"\n\nStyle: \"{}\"\n\nGenerate a very short, punchy Hook (max 10 words) and a detailed, easy-to-read Revelation (max 30 words) based on this style.",
                article, style_prompt
            )),
        ];
        let reply = self.complete(Stage::Script, messages, 250).await?;
        parse_script(&reply).ok_or_else(|| {
            EngineError::unavailable(Stage::Script, "reply did not contain a 'hook ||| revelation' pair")
        })
    }

    async fn generate_caption(
        &self,
        script: &Script,
        source_name: &str,
        credit: Option<&str>,
    ) -> Result<String> {
        let credit_line = credit
            .map(|credit| format!("\n\nCredits:\n{}", credit))
            .unwrap_or_default();
        let messages = vec![
            ChatMessage::system(
                "You are a social media manager for 'NextGen Signals' crafting viral captions for Instagram Reels. Be engaging, add value, and encourage discussion.",
            ),
            ChatMessage::user(format!(
                "Video Script:\nHook: {}\nRevelation: {}\n\nSource: {}\n\nWrite an engaging caption. Start with a strong opening, elaborate slightly on the revelation, and end with a question to boost comments. Add a 'Follow for more tech insights!' call to action.{}",
                script.hook, script.revelation, source_name, credit_line
            )),
        ];
        self.complete(Stage::Caption, messages, 150).await
    }

    async fn generate_hashtags(&self, topic: &str) -> Result<Vec<String>> {
        let messages = vec![
            ChatMessage::system(
                "You are a hashtag expert. Generate a list of 15 relevant hashtags for a tech and AI brand, mixing popular and niche tags. Return as a comma-separated list.",
            ),
            ChatMessage::user(format!("Topic: {}", topic)),
        ];
        let reply = self.complete(Stage::Hashtags, messages, 100).await?;
        Ok(parse_hashtags(&reply))
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

impl ChatMessage {
    fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

pub fn parse_script(reply: &str) -> Option<Script> {
    let (hook, revelation) = reply.split_once("|||")?;
    let revelation = revelation.split("|||").next().unwrap_or_default();
    let hook = clean_part(hook, "Hook:");
    let revelation = clean_part(revelation, "Revelation:");
    if hook.is_empty() || revelation.is_empty() {
        return None;
    }
    Some(Script { hook, revelation })
}

fn clean_part(part: &str, label: &str) -> String {
    part.replace(label, "").trim().replace('"', "")
}

pub fn parse_hashtags(reply: &str) -> Vec<String> {
    reply
        .split(',')
        .map(|tag| tag.trim().trim_start_matches('#').trim())
        .filter(|tag| !tag.is_empty())
        .map(|tag| format!("#{}", tag))
        .collect()
}
