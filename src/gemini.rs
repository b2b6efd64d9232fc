//! Client for the hosted Gemini image model.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::data_url::{BaseImage, DataUrl};
use crate::error::{GenerationError, GenerationResult};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image-preview";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const NO_IMAGE_MESSAGE: &str = "No image was generated in the response.";

/// Produces an edited image from a base image, an optional background image
/// and an instruction. Returns the result as a data URL.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(
        &self,
        base_image: &BaseImage,
        prompt: &str,
        background_image: Option<&BaseImage>,
    ) -> GenerationResult<String>;
}

#[derive(Debug, Clone)]
pub struct GeminiClientBuilder {
    api_key: Option<String>,
    model: String,
    base_url: String,
    client: Option<Client>,
}

impl Default for GeminiClientBuilder {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            client: None,
        }
    }
}

impl GeminiClientBuilder {
    pub fn api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key.filter(|value| !value.trim().is_empty());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn http_client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> GeminiClient {
        GeminiClient {
            client: self.client.unwrap_or_default(),
            api_key: self.api_key,
            model: self.model,
            base_url: self.base_url,
        }
    }
}

/// A missing key is not an error here; it is reported by each generation
/// attempt instead.
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn builder() -> GeminiClientBuilder {
        GeminiClientBuilder::default()
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    async fn request_variation(&self, api_key: &str, body: &GenerateContentRequest) -> Result<String> {
        tracing::debug!(
            model = %self.model,
            parts = body.contents.parts.len(),
            "sending generateContent request"
        );
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(body)
            .send()
            .await?;

        let response = assert_ok_response(response).await?;
        let payload: GenerateContentResponse = response.json().await?;
        if let Some(error) = payload.error.and_then(|err| err.message) {
            return Err(anyhow!("Gemini returned an error: {error}"));
        }
        let parts = payload
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts)
            .unwrap_or_default();

        for part in &parts {
            if let ResponsePart::Text { text } = part {
                tracing::debug!("model text: {text}");
            }
        }
        first_image(parts)
            .map(|url| url.to_string())
            .ok_or_else(|| anyhow!(NO_IMAGE_MESSAGE))
    }
}

#[async_trait]
impl ImageGenerator for GeminiClient {
    async fn generate(
        &self,
        base_image: &BaseImage,
        prompt: &str,
        background_image: Option<&BaseImage>,
    ) -> GenerationResult<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(GenerationError::MissingCredential)?;
        let body = GenerateContentRequest::new(base_image, prompt, background_image);
        self.request_variation(api_key, &body).await.map_err(|err| {
            tracing::error!("Error generating image variation: {err:#}");
            GenerationError::Failed
        })
    }
}

async fn assert_ok_response(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    Err(anyhow!("Gemini request failed: {status} {text}"))
}

/// The first inline image among the parts, rebuilt as a data URL.
fn first_image(parts: Vec<ResponsePart>) -> Option<DataUrl> {
    parts.into_iter().find_map(|part| match part {
        ResponsePart::InlineData { inline_data } => {
            Some(DataUrl::new(inline_data.mime_type, inline_data.data))
        }
        ResponsePart::Text { .. } | ResponsePart::Other(_) => None,
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: RequestContent,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    Text {
        text: String,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<&'static str>,
}

impl RequestPart {
    fn image(image: &BaseImage) -> Self {
        let inline = image.inline_data();
        Self::InlineData {
            inline_data: InlineData {
                mime_type: inline.mime_type().to_string(),
                data: inline.payload().to_string(),
            },
        }
    }
}

impl GenerateContentRequest {
    /// Image parts first (base, then background), text last.
    fn new(base_image: &BaseImage, prompt: &str, background_image: Option<&BaseImage>) -> Self {
        let mut parts = vec![RequestPart::image(base_image)];
        if let Some(background) = background_image {
            parts.push(RequestPart::image(background));
        }
        parts.push(RequestPart::Text {
            text: prompt.to_string(),
        });

        Self {
            contents: RequestContent { parts },
            generation_config: GenerationConfig {
                response_modalities: vec!["IMAGE", "TEXT"],
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ResponsePart {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    Text {
        text: String,
    },
    Other(serde::de::IgnoredAny),
}
