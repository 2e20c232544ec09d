use async_trait::async_trait;
use model_gateway_rs::{
    clients::llm::LlmClient,
    model::llm::{ChatMessage, LlmInput, LlmOutput},
    sdk::{ModelSDK, openai::OpenAiSdk},
    traits::ModelClient,
};
use tracing::debug;

use crate::{
    error::Result, judgment::JudgmentStrategy, prompt::builder::JUDGMENT_SYSTEM_PROMPT,
    utils::string_util::JsonPayload,
};

/// Judgment backed by a chat model.
pub struct LlmJudgment<T>
where
    T: ModelSDK<Input = LlmInput, Output = LlmOutput> + Sync + Send,
{
    llm_client: LlmClient<T>,
}

impl<T> LlmJudgment<T>
where
    T: ModelSDK<Input = LlmInput, Output = LlmOutput> + Sync + Send,
{
    pub fn new(llm_client: LlmClient<T>) -> Self {
        Self { llm_client }
    }
}

impl LlmJudgment<OpenAiSdk> {
    /// Connect to any OpenAI-compatible endpoint.
    pub fn openai(api_key: &str, base_url: &str, model: &str) -> Result<Self> {
        let client = OpenAiSdk::new(api_key, base_url, model)?;
        Ok(Self::new(LlmClient::new(client)))
    }
}

#[async_trait]
impl<T> JudgmentStrategy for LlmJudgment<T>
where
    T: ModelSDK<Input = LlmInput, Output = LlmOutput> + Sync + Send,
{
    fn name(&self) -> &str {
        "llm"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let input = LlmInput {
            messages: vec![
                ChatMessage::system(JUDGMENT_SYSTEM_PROMPT),
                ChatMessage::user(prompt),
            ],
            max_tokens: Some(4096),
        };

        let output: LlmOutput = self.llm_client.infer(input).await?;
        let content = output.get_content();
        debug!("LlmJudgment received {} bytes", content.len());
        Ok(content.json_payload().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_constructor_builds_without_network() {
        let judgment = LlmJudgment::openai("", "http://localhost:11434/v1", "llama3.2").unwrap();
        assert_eq!(judgment.name(), "llm");
    }
}
