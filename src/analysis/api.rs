use serde::Deserialize;
use url::Url;

use crate::analysis::model::{Analysis, RiskLevel, Sentiment};
use crate::analysis::prompt::SYSTEM_PROMPT;
use crate::analysis::wire::{ChatMessage, ChatRequest, ChatResponse, ResponseFormat};
use crate::core::{FetchError, HttpClient, net};

pub(crate) async fn complete(
    client: &HttpClient,
    base: &Url,
    api_key: &str,
    model: &str,
    prompt: &str,
) -> Result<String, FetchError> {
    let url = base
        .join("chat/completions")
        .map_err(|e| FetchError::Malformed(format!("completion url: {e}")))?;

    let body = ChatRequest {
        model,
        messages: vec![
            ChatMessage {
                role: "system",
                content: SYSTEM_PROMPT,
            },
            ChatMessage {
                role: "user",
                content: prompt,
            },
        ],
        response_format: ResponseFormat {
            kind: "json_object",
        },
        temperature: 0.3,
    };

    let req = client.http().post(url).bearer_auth(api_key).json(&body);
    let resp = client.send_with_retry(req).await?;
    let parsed: ChatResponse = net::get_json(resp, "chat_completion").await?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| FetchError::Malformed("completion returned no content".into()))
}

#[derive(Deserialize)]
struct StructuredReply {
    #[serde(default)]
    summary: Option<String>,
    sentiment: Sentiment,
    #[serde(default)]
    key_factors: Vec<String>,
    risk_level: RiskLevel,
}

/// Splits a completion into the commentary text and its structured analysis.
pub(crate) fn parse_completion(content: &str) -> Result<(String, Analysis), FetchError> {
    let json = strip_fences(content);
    let reply: StructuredReply = serde_json::from_str(json)
        .map_err(|e| FetchError::Malformed(format!("completion json parse: {e}")))?;

    let text = reply
        .summary
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| json.to_string());
    let key_factors = reply
        .key_factors
        .into_iter()
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .collect();

    Ok((
        text,
        Analysis {
            sentiment: reply.sentiment,
            key_factors,
            risk_level: reply.risk_level,
        },
    ))
}

fn strip_fences(content: &str) -> &str {
    let t = content.trim();
    let Some(rest) = t.strip_prefix("```") else {
        return t;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
