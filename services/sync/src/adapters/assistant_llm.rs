//! services/sync/src/adapters/assistant_llm.rs
//!
//! This module contains the adapter for the generative-language service.
//! It implements the `AssistantService` port from the `core` crate against an
//! OpenAI-compatible chat-completion API.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use madrasa_console_core::ports::{AssistantService, Conversation, ServiceError};

use crate::config::Config;
use crate::error::SyncError;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `AssistantService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiAssistantAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiAssistantAdapter {
    /// Creates a new `OpenAiAssistantAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    /// Builds the adapter from environment configuration.
    pub fn from_config(config: &Config) -> Result<Self, SyncError> {
        let api_key = config
            .assistant_api_key
            .as_ref()
            .ok_or_else(|| SyncError::Internal("ASSISTANT_API_KEY is required".to_string()))?;

        let mut openai_config = OpenAIConfig::new().with_api_key(api_key);
        if let Some(base) = &config.assistant_api_base {
            openai_config = openai_config.with_api_base(base);
        }

        Ok(Self::new(
            Client::with_config(openai_config),
            config.assistant_model.clone(),
        ))
    }
}

/// Runs one chat-completion request and extracts the first choice's text.
async fn complete(
    client: &Client<OpenAIConfig>,
    model: &str,
    messages: Vec<ChatCompletionRequestMessage>,
) -> Result<String, ServiceError> {
    let request = CreateChatCompletionRequestArgs::default()
        .model(model)
        .messages(messages)
        .n(1)
        .build()
        .map_err(|e| ServiceError(e.to_string()))?;

    // Call the API and manually map the error if it occurs, which respects the orphan rule.
    let response = client
        .chat()
        .create(request)
        .await
        .map_err(|e: OpenAIError| ServiceError(e.to_string()))?;

    // Extract the text content from the first choice in the response.
    if let Some(choice) = response.choices.into_iter().next() {
        if let Some(content) = choice.message.content {
            Ok(content)
        } else {
            Err(ServiceError(
                "Assistant response contained no text content.".to_string(),
            ))
        }
    } else {
        Err(ServiceError(
            "Assistant returned no choices in its response.".to_string(),
        ))
    }
}

//=========================================================================================
// The Conversation Handle
//=========================================================================================

/// One ongoing dialogue. The full history is resent with each request, which
/// is how the chat-completion API keeps the session stateful.
pub struct OpenAiConversation {
    client: Client<OpenAIConfig>,
    model: String,
    history: Vec<ChatCompletionRequestMessage>,
}

#[async_trait]
impl Conversation for OpenAiConversation {
    async fn send(&mut self, text: &str) -> Result<String, ServiceError> {
        let user_message: ChatCompletionRequestMessage = ChatCompletionRequestUserMessageArgs::default()
            .content(text)
            .build()
            .map_err(|e| ServiceError(e.to_string()))?
            .into();
        self.history.push(user_message);

        let reply = complete(&self.client, &self.model, self.history.clone()).await?;

        let assistant_message: ChatCompletionRequestMessage =
            ChatCompletionRequestAssistantMessageArgs::default()
                .content(reply.clone())
                .build()
                .map_err(|e| ServiceError(e.to_string()))?
                .into();
        self.history.push(assistant_message);

        Ok(reply)
    }
}

//=========================================================================================
// `AssistantService` Trait Implementation
//=========================================================================================

#[async_trait]
impl AssistantService for OpenAiAssistantAdapter {
    async fn start_conversation(
        &self,
        system_prompt: &str,
    ) -> Result<Box<dyn Conversation>, ServiceError> {
        let system_message: ChatCompletionRequestMessage =
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system_prompt)
                .build()
                .map_err(|e| ServiceError(e.to_string()))?
                .into();

        Ok(Box::new(OpenAiConversation {
            client: self.client.clone(),
            model: self.model.clone(),
            history: vec![system_message],
        }))
    }

    async fn generate(&self, prompt: &str) -> Result<String, ServiceError> {
        let user_message: ChatCompletionRequestMessage = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| ServiceError(e.to_string()))?
            .into();

        complete(&self.client, &self.model, vec![user_message]).await
    }
}
