use serde::{Deserialize, Serialize};

use super::{provider_error_message, DraftingError, Provider};

/// OpenAI chat-completions client.
///
/// Uses `reqwest::blocking`; build and use it off the async runtime.
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OpenAiClient {
    pub fn new(base_url: &str, api_key: &str, timeout_secs: u64) -> Result<Self, DraftingError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| DraftingError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
            timeout_secs,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Send one system + user prompt and return the first choice's text.
    pub fn chat(&self, model: &str, system: &str, prompt: &str) -> Result<String, DraftingError> {
        let body = ChatRequest::new(model, system, prompt);
        let value = self.post_json(&serde_json::to_value(&body).map_err(|e| {
            DraftingError::ResponseParsing(format!("cannot encode request: {e}"))
        })?)?;
        parse_chat_response(value)
    }

    /// POST an arbitrary chat-completions body and return the provider JSON.
    pub fn post_json(&self, body: &serde_json::Value) -> Result<serde_json::Value, DraftingError> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    DraftingError::HttpClient(format!(
                        "Request timed out after {}s",
                        self.timeout_secs
                    ))
                } else {
                    DraftingError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "OpenAI request failed");
            return Err(upstream_error(status.as_u16(), &body));
        }

        response
            .json()
            .map_err(|e| DraftingError::ResponseParsing(e.to_string()))
    }
}

fn upstream_error(status: u16, body: &str) -> DraftingError {
    DraftingError::Upstream {
        provider: Provider::OpenAi,
        status,
        message: provider_error_message(body)
            .unwrap_or_else(|| "Falha na comunicação com a OpenAI".to_string()),
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> ChatRequest<'a> {
    fn new(model: &'a str, system: &'a str, prompt: &'a str) -> Self {
        let mut messages = Vec::with_capacity(2);
        if !system.trim().is_empty() {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });
        Self { model, messages }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

fn parse_chat_response(value: serde_json::Value) -> Result<String, DraftingError> {
    let parsed: ChatResponse = serde_json::from_value(value)
        .map_err(|e| DraftingError::ResponseParsing(e.to_string()))?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|text| !text.trim().is_empty())
        .ok_or(DraftingError::EmptyCompletion)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_carries_system_and_user_messages() {
        let body = serde_json::to_value(ChatRequest::new("gpt-4o", "Você é ortodontista", "Caso"))
            .unwrap();
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "Caso");
    }

    #[test]
    fn blank_system_prompt_is_omitted() {
        let body = serde_json::to_value(ChatRequest::new("gpt-4o", " ", "Caso")).unwrap();
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn parses_first_choice() {
        let value = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "Diagnóstico: Classe II"}}]
        });
        assert_eq!(parse_chat_response(value).unwrap(), "Diagnóstico: Classe II");
    }

    #[test]
    fn empty_choices_is_empty_completion() {
        let value = serde_json::json!({"choices": []});
        assert!(matches!(
            parse_chat_response(value),
            Err(DraftingError::EmptyCompletion)
        ));
    }

    #[test]
    fn upstream_error_uses_provider_message() {
        let err = upstream_error(401, r#"{"error":{"message":"Invalid key"}}"#);
        match err {
            DraftingError::Upstream { status, message, provider } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid key");
                assert_eq!(provider, Provider::OpenAi);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn upstream_error_falls_back_to_generic_message() {
        let err = upstream_error(502, "<html>bad gateway</html>");
        assert!(err.to_string().contains("Falha na comunicação"));
    }

    #[test]
    fn endpoint_strips_trailing_slash() {
        let client = OpenAiClient::new("https://api.openai.com/v1/", "sk", 5).unwrap();
        assert_eq!(client.endpoint(), "https://api.openai.com/v1/chat/completions");
    }
}
