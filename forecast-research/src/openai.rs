use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use forecast_core::{ForecastError, ForecastResult, SentimentAssessment, SentimentOracle};
use tracing::{debug, instrument};

use crate::types::SentimentReply;

const DEFAULT_MODEL: &str = "gpt-4o-mini";

const SENTIMENT_SYSTEM_PROMPT: &str = r#"You are an equity news analyst. You will receive a single news headline.
Judge how the headline is likely to move the share price of the companies it mentions over the next few trading days.

Respond with valid JSON in this exact format:
{
  "sentiment": -1.0 to 1.0 (negative = bearish, positive = bullish, 0 = no price impact),
  "confidence_score": 0 to 100 (how sure you are of the reading),
  "affected_entities": ["TICKER or company name", ...],
  "duration": "short-term" | "medium-term" | "long-term",
  "rationale": "one sentence"
}

Guidelines:
- Most headlines are noise; keep |sentiment| below 0.3 unless the news is material
- Earnings beats/misses, guidance changes, regulatory actions and M&A are material
- Do not infer sentiment from the company's reputation, only from the headline"#;

/// OpenAI chat client used as a headline sentiment oracle
#[derive(Debug, Clone)]
pub struct OpenAISentimentOracle {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAISentimentOracle {
    /// Create an oracle from the environment; `OPENAI_API_KEY` must be set
    pub fn from_env() -> ForecastResult<Self> {
        match std::env::var("OPENAI_API_KEY") {
            Ok(key) if !key.trim().is_empty() => {}
            _ => return Err(ForecastError::config("OPENAI_API_KEY not set")),
        }
        // async-openai reads OPENAI_API_KEY from env automatically
        let config = OpenAIConfig::default();
        Ok(Self {
            client: Client::with_config(config),
            model: DEFAULT_MODEL.to_string(),
        })
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// One system + user exchange, returning the raw assistant text
    #[instrument(skip(self, system_prompt, user_prompt))]
    pub async fn simple_chat(&self, system_prompt: &str, user_prompt: &str) -> ForecastResult<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages([
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system_prompt)
                    .build()
                    .map_err(|e| ForecastError::internal(e.to_string()))?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(user_prompt)
                    .build()
                    .map_err(|e| ForecastError::internal(e.to_string()))?
                    .into(),
            ])
            .temperature(0.0)
            .build()
            .map_err(|e| ForecastError::internal(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| ForecastError::api(format!("OpenAI API error: {}", e)))?;

        response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| ForecastError::parse("No response from OpenAI"))
    }
}

#[async_trait]
impl SentimentOracle for OpenAISentimentOracle {
    #[instrument(skip(self))]
    async fn assess(&self, text: &str) -> ForecastResult<SentimentAssessment> {
        let user_prompt = format!("Headline: {}", text);
        let content = self.simple_chat(SENTIMENT_SYSTEM_PROMPT, &user_prompt).await?;
        let assessment = parse_sentiment_reply(&content)?;
        debug!(
            "Headline sentiment {:+.2} ({} entities)",
            assessment.sentiment,
            assessment.affected_entities.len()
        );
        Ok(assessment)
    }

    fn name(&self) -> &str {
        "OpenAI"
    }
}

/// Parse a model reply, tolerating markdown fences and a bare number
pub fn parse_sentiment_reply(content: &str) -> ForecastResult<SentimentAssessment> {
    if let Ok(json_str) = extract_json(content) {
        let reply: SentimentReply = serde_json::from_str(&json_str)
            .map_err(|e| ForecastError::parse(format!("Failed to parse sentiment reply: {}", e)))?;
        return Ok(reply.into());
    }

    // Older prompt revisions asked for a single float
    content
        .trim()
        .parse::<f64>()
        .map(SentimentAssessment::polarity)
        .map_err(|_| ForecastError::parse("No JSON found in response"))
}

/// Extract JSON from response (handles markdown code blocks)
fn extract_json(content: &str) -> ForecastResult<String> {
    if let Some(start) = content.find("```json") {
        let start = start + 7;
        if let Some(end) = content[start..].find("```") {
            return Ok(content[start..start + end].trim().to_string());
        }
    }

    if let (Some(start), Some(end)) = (content.find('{'), content.rfind('}')) {
        if start < end {
            return Ok(content[start..=end].to_string());
        }
    }

    Err(ForecastError::parse("No JSON found in response"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_from_fence() {
        let reply = "Here you go:\n```json\n{\"sentiment\": 0.4}\n```";
        assert_eq!(extract_json(reply).unwrap(), "{\"sentiment\": 0.4}");
    }

    #[test]
    fn test_extract_json_raw() {
        let reply = "Sure. {\"sentiment\": -0.2, \"rationale\": \"weak guidance\"} Done.";
        assert_eq!(
            extract_json(reply).unwrap(),
            "{\"sentiment\": -0.2, \"rationale\": \"weak guidance\"}"
        );
        assert!(extract_json("no braces here").is_err());
    }

    #[test]
    fn test_parse_sentiment_reply_variants() {
        let structured = parse_sentiment_reply(
            r#"{"sentiment": 0.6, "confidence_score": 80, "affected_entities": ["NVDA"], "rationale": "Strong data-center demand"}"#,
        )
        .unwrap();
        assert_eq!(structured.sentiment, 0.6);
        assert_eq!(structured.affected_entities, vec!["NVDA".to_string()]);

        let bare = parse_sentiment_reply(" -0.35 ").unwrap();
        assert_eq!(bare.sentiment, -0.35);

        assert!(parse_sentiment_reply("I cannot determine that").is_err());
        assert!(parse_sentiment_reply("{\"mood\": \"good\"}").is_err());
    }
}
