use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{BlobStore, PlatformError};
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{LlmClient, LlmError};

/// Chat-style completion returned by the AI capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiResponse {
    pub message: AiMessage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiMessage {
    pub content: MessageContent,
}

/// Completions arrive either as one string or as a list of text parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPart {
    pub text: String,
}

impl AiResponse {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            message: AiMessage {
                content: MessageContent::Text(text.into()),
            },
        }
    }

    /// The string content, or the first part's text for list content.
    pub fn text(&self) -> Option<&str> {
        match &self.message.content {
            MessageContent::Text(text) => Some(text),
            MessageContent::Parts(parts) => parts.first().map(|p| p.text.as_str()),
        }
    }
}

#[async_trait]
pub trait AiService: Send + Sync {
    /// Reviews the file stored at `file_path` following `instructions`.
    async fn feedback(&self, file_path: &str, instructions: &str)
        -> Result<AiResponse, PlatformError>;
}

/// Production AI capability: pulls the PDF out of blob storage, extracts its
/// text and sends it with the instructions through the LLM client.
pub struct LlmAiService {
    llm: LlmClient,
    fs: Arc<dyn BlobStore>,
}

impl LlmAiService {
    pub fn new(llm: LlmClient, fs: Arc<dyn BlobStore>) -> Self {
        Self { llm, fs }
    }
}

#[async_trait]
impl AiService for LlmAiService {
    async fn feedback(
        &self,
        file_path: &str,
        instructions: &str,
    ) -> Result<AiResponse, PlatformError> {
        let pdf = self
            .fs
            .read(file_path)
            .await?
            .ok_or_else(|| PlatformError::Storage(format!("no blob at {file_path}")))?;

        let resume_text = extract_pdf_text(pdf).await?;
        debug!(
            "Extracted {} chars of resume text from {}",
            resume_text.len(),
            file_path
        );

        let prompt = format!("{instructions}\n\nResume:\n{resume_text}");
        let response = self.llm.call(&prompt, JSON_ONLY_SYSTEM).await?;

        let parts: Vec<ContentPart> = response
            .texts()
            .map(|text| ContentPart {
                text: text.to_string(),
            })
            .collect();
        if parts.is_empty() {
            return Err(LlmError::EmptyContent.into());
        }

        Ok(AiResponse {
            message: AiMessage {
                content: MessageContent::Parts(parts),
            },
        })
    }
}

async fn extract_pdf_text(pdf: Bytes) -> Result<String, PlatformError> {
    tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&pdf))
        .await
        .map_err(|e| PlatformError::Pdf(format!("Task join error: {e}")))?
        .map_err(|e| PlatformError::Pdf(format!("text extraction failed: {e}")))
}
