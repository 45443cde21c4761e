//! Concrete [`LlmGateway`] backend speaking the OpenRouter / OpenAI-style
//! chat-completions wire format.

use async_trait::async_trait;
use backoff::ExponentialBackoff;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::gateway::{LlmGateway, ToolSelection};
use crate::core::types::{GenerationOptions, Message, ToolDefinition};
use crate::domain::Tool;
use crate::error::{Error, Result};

/// HTTP-backed LLM gateway.
#[derive(Clone)]
pub struct OpenRouterGateway {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

impl OpenRouterGateway {
    /// Construct a gateway against the real OpenRouter API.
    pub fn new(api_key: SecretString) -> Result<Self> {
        Self::with_base_url(api_key, "https://openrouter.ai/api/v1")
    }

    /// Construct a gateway against an arbitrary OpenAI-compatible base URL
    /// (used in tests against a `wiremock` server).
    pub fn with_base_url(api_key: SecretString, base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()?;
        Ok(OpenRouterGateway {
            client,
            base_url: base_url.into(),
            api_key,
        })
    }

    async fn send(&self, request: &ChatCompletionRequest<'_>) -> Result<ChatCompletionResponse> {
        let url = format!("{}/chat/completions", self.base_url);
        let op = || async {
            debug!(model = request.model, "sending chat completion request");
            let response = self
                .client
                .post(&url)
                .bearer_auth(self.api_key.expose_secret())
                .json(request)
                .send()
                .await
                .map_err(|e| {
                    let err = Error::Http(e);
                    if err.is_retryable() {
                        backoff::Error::transient(err)
                    } else {
                        backoff::Error::permanent(err)
                    }
                })?;

            let status = response.status();
            if status.is_success() {
                response
                    .json::<ChatCompletionResponse>()
                    .await
                    .map_err(|e| backoff::Error::permanent(Error::Http(e)))
            } else if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!(status = %status, "transient gateway error, retrying");
                Err(backoff::Error::transient(Error::Provider(format!(
                    "gateway returned {status}: {body}"
                ))))
            } else {
                let body = response.text().await.unwrap_or_default();
                Err(backoff::Error::permanent(Error::Provider(format!(
                    "gateway returned {status}: {body}"
                ))))
            }
        };

        backoff::future::retry(ExponentialBackoff::default(), op)
            .await
            .map_err(Error::into_provider)
    }
}

#[async_trait]
impl LlmGateway for OpenRouterGateway {
    async fn tool_selection(&self, model: &str, query: &str, tools: &[Tool]) -> Result<ToolSelection> {
        let tool_defs: Vec<ToolDefinition> = tools.iter().map(ToolDefinition::from_tool).collect();
        let request = ChatCompletionRequest {
            model,
            messages: vec![Message::user(query)],
            options: GenerationOptions::precise(),
            tools: Some(tool_defs),
            tool_choice: Some("auto"),
        };

        let response = self.send(&request).await.map_err(Error::into_provider)?;
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::Provider("gateway returned no choices".into()))?;

        match choice.message.tool_calls.and_then(|calls| calls.into_iter().next()) {
            Some(call) => {
                let arguments = serde_json::from_str(&call.function.arguments).ok();
                Ok(ToolSelection { selected_tool_name: Some(call.function.name), arguments })
            }
            None => Ok(ToolSelection::none()),
        }
    }

    async fn text_completion(&self, model: &str, prompt: &str, max_output_tokens: u32) -> Result<String> {
        let request = ChatCompletionRequest {
            model,
            messages: vec![Message::user(prompt)],
            options: GenerationOptions::reflection(max_output_tokens),
            tools: None,
            tool_choice: None,
        };

        let response = self.send(&request).await.map_err(Error::into_provider)?;
        let content = response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();
        Ok(content)
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    #[serde(flatten)]
    options: GenerationOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ToolDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ResponseChoice>,
}

#[derive(Debug, Deserialize)]
struct ResponseChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
    #[serde(default)]
    tool_calls: Option<Vec<ResponseToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ResponseToolCall {
    function: ResponseFunctionCall,
}

#[derive(Debug, Deserialize)]
struct ResponseFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gateway(base_url: String) -> OpenRouterGateway {
        OpenRouterGateway::with_base_url(SecretString::from("test-key"), base_url).unwrap()
    }

    fn sample_tool(name: &str) -> Tool {
        Tool {
            id: format!("id-{name}"),
            name: name.to_string(),
            description: "does something".to_string(),
            input_schema: serde_json::json!({"type": "object"}),
            server_id: "srv".into(),
        }
    }

    #[tokio::test]
    async fn tool_selection_parses_first_tool_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{
                    "message": {
                        "content": "",
                        "tool_calls": [{"function": {"name": "weather", "arguments": "{}"}}]
                    }
                }]
            })))
            .mount(&server)
            .await;

        let gw = gateway(server.uri());
        let result = gw
            .tool_selection("test-model", "what is the weather", &[sample_tool("weather")])
            .await
            .unwrap();
        assert_eq!(result.selected_tool_name.as_deref(), Some("weather"));
    }

    #[tokio::test]
    async fn tool_selection_returns_none_without_tool_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "I don't know"}}]
            })))
            .mount(&server)
            .await;

        let gw = gateway(server.uri());
        let result = gw
            .tool_selection("test-model", "anything", &[sample_tool("weather")])
            .await
            .unwrap();
        assert!(result.selected_tool_name.is_none());
    }

    #[tokio::test]
    async fn transport_error_degrades_to_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
            .mount(&server)
            .await;

        let gw = gateway(server.uri());
        let err = gw
            .tool_selection("test-model", "anything", &[sample_tool("weather")])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Provider(_)));
    }
}
