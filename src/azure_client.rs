use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::{debug, error};
use url::Url;

use crate::cli::reflect::conversation_state::Message;
use crate::cli::reflect::generator::TextGenerator;
use crate::config::AzureConfig;
use crate::error::GenerationError;

/// Chat completions client for an Azure OpenAI deployment.
pub struct AzureOpenAiClient {
    config: AzureConfig,
    client: reqwest::Client,
}

impl AzureOpenAiClient {
    pub fn new(config: AzureConfig) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self { config, client })
    }

    /// Build a client from the process environment.
    pub fn from_env() -> eyre::Result<Self> {
        let config = AzureConfig::from_env()?;
        Ok(Self::new(config)?)
    }

    pub fn completions_url(&self) -> Result<Url, GenerationError> {
        completions_url(&self.config)
    }
}

#[async_trait]
impl TextGenerator for AzureOpenAiClient {
    async fn invoke(
        &self,
        history: &[Message],
        system_instruction: &str,
    ) -> Result<String, GenerationError> {
        let url = self.completions_url()?;
        let request_body = build_request_body(history, system_instruction);

        debug!(
            "Sending request to Azure OpenAI: {}",
            serde_json::to_string_pretty(&request_body).unwrap_or_default()
        );

        let response = self
            .client
            .post(url)
            .header("api-key", &self.config.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("API request failed with status {}: {}", status, error_text);
            return Err(status_error(status, error_text));
        }

        let response_json: Value = response.json().await?;
        debug!(
            "Received response from Azure OpenAI: {}",
            serde_json::to_string_pretty(&response_json).unwrap_or_default()
        );

        extract_content(&response_json).ok_or(GenerationError::EmptyResponse)
    }
}

/// `{endpoint}/openai/deployments/{deployment}/chat/completions?api-version={version}`
pub fn completions_url(config: &AzureConfig) -> Result<Url, GenerationError> {
    let mut base = config.endpoint.trim().to_string();
    if !base.ends_with('/') {
        base.push('/');
    }

    let mut url = Url::parse(&base)?.join(&format!(
        "openai/deployments/{}/chat/completions",
        config.deployment
    ))?;
    url.query_pairs_mut()
        .append_pair("api-version", &config.api_version);
    Ok(url)
}

/// System instruction first, then the history in order.
pub fn build_request_body(history: &[Message], system_instruction: &str) -> Value {
    let mut formatted_messages = Vec::with_capacity(history.len() + 1);

    formatted_messages.push(json!({
        "role": "system",
        "content": system_instruction,
    }));

    formatted_messages.extend(history.iter().map(|message| json!(message)));

    json!({ "messages": formatted_messages })
}

/// Text of the first choice, if the model produced any.
pub fn extract_content(response: &Value) -> Option<String> {
    response
        .get("choices")?
        .as_array()?
        .first()?
        .get("message")?
        .get("content")?
        .as_str()
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

fn status_error(status: StatusCode, message: String) -> GenerationError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GenerationError::Auth {
            status: status.as_u16(),
            message,
        },
        StatusCode::TOO_MANY_REQUESTS => GenerationError::RateLimited(message),
        _ => GenerationError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn config(endpoint: &str) -> AzureConfig {
        AzureConfig {
            deployment: "gpt-4o".to_string(),
            api_version: "2024-06-01".to_string(),
            endpoint: endpoint.to_string(),
            api_key: "secret".to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn url_includes_deployment_and_version() {
        let expected = "https://example.openai.azure.com/openai/deployments/gpt-4o/chat/completions?api-version=2024-06-01";

        let with_slash = completions_url(&config("https://example.openai.azure.com/")).unwrap();
        let without_slash = completions_url(&config("https://example.openai.azure.com")).unwrap();

        assert_eq!(with_slash.as_str(), expected);
        assert_eq!(without_slash.as_str(), expected);
    }

    #[test]
    fn bad_endpoint_is_rejected() {
        let err = completions_url(&config("not a url")).unwrap_err();
        assert!(matches!(err, GenerationError::Endpoint(_)));
    }

    #[test]
    fn request_body_puts_system_instruction_first() {
        let history = vec![
            Message::user("Make this tweet better: \"hi\""),
            Message::assistant("Hi there!"),
            Message::user("Add an emoji"),
        ];

        let body = build_request_body(&history, "be brief");
        let messages = body["messages"].as_array().unwrap();

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0], json!({ "role": "system", "content": "be brief" }));
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[2], json!({ "role": "assistant", "content": "Hi there!" }));
        assert_eq!(messages[3]["content"], "Add an emoji");
    }

    #[test]
    fn content_comes_from_first_choice() {
        let response = json!({
            "choices": [
                { "index": 0, "message": { "role": "assistant", "content": "shipped it" } },
                { "index": 1, "message": { "role": "assistant", "content": "ignored" } }
            ]
        });

        assert_eq!(extract_content(&response).as_deref(), Some("shipped it"));
    }

    #[test]
    fn missing_or_empty_content_yields_none() {
        assert!(extract_content(&json!({ "choices": [] })).is_none());
        assert!(extract_content(&json!({ "error": "nope" })).is_none());
        assert!(extract_content(&json!({
            "choices": [{ "message": { "role": "assistant", "content": null } }]
        }))
        .is_none());
        assert!(extract_content(&json!({
            "choices": [{ "message": { "role": "assistant", "content": "" } }]
        }))
        .is_none());
    }

    #[test]
    fn status_codes_map_to_error_kinds() {
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, String::new()),
            GenerationError::Auth { status: 401, .. }
        ));
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, String::new()),
            GenerationError::RateLimited(_)
        ));
        assert!(matches!(
            status_error(StatusCode::BAD_GATEWAY, "upstream".to_string()),
            GenerationError::Api { status: 502, .. }
        ));
    }
}
