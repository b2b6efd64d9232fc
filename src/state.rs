//! Application state and the reducer that applies form events to it.
//!
//! `AppState::update` is the only place state changes. It never performs
//! I/O; work that must leave the process is returned as a [`Command`] and
//! its outcome comes back as [`Message::GenerationFinished`].

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::data_url::BaseImage;
use crate::error::{GenerationError, MISSING_BASE_IMAGE_MESSAGE};
use crate::gallery::{Gallery, GeneratedImage};
use crate::params::{ParamField, VariationParams};
use crate::prompt::build_prompt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "lowercase")]
pub enum RequestStatus {
    Idle,
    Generating,
    Failed(String),
}

/// Everything one generation call needs, captured when it is requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationJob {
    pub base_image: BaseImage,
    pub background_image: Option<BaseImage>,
    pub params: VariationParams,
    pub prompt: String,
}

impl GenerationJob {
    fn new(base_image: BaseImage, params: VariationParams, background_image: Option<BaseImage>) -> Self {
        let prompt = build_prompt(&params, background_image.is_some());
        Self {
            base_image,
            background_image,
            params,
            prompt,
        }
    }
}

#[derive(Debug)]
pub enum Message {
    BaseImageLoaded(BaseImage),
    BackgroundImageLoaded(BaseImage),
    BackgroundImageCleared,
    ParamChanged(ParamField, String),
    Submit,
    Regenerate(String),
    Delete(String),
    GenerationFinished {
        job: GenerationJob,
        result: Result<String, GenerationError>,
        finished_at: DateTime<Utc>,
    },
    DismissError,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Generate(GenerationJob),
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub base_image: Option<BaseImage>,
    pub background_image: Option<BaseImage>,
    pub params: VariationParams,
    pub gallery: Gallery,
    pub status: RequestStatus,
    /// Jobs started and not yet reported back. Independent of `status`,
    /// which follows whichever job finished last.
    pub in_flight: usize,
    /// Bumped whenever either upload slot changes.
    pub uploads_revision: u64,
}

/// Slot metadata without the image payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageInfo {
    pub file_name: String,
    pub mime_type: String,
}

impl From<&BaseImage> for ImageInfo {
    fn from(image: &BaseImage) -> Self {
        Self {
            file_name: image.file_name.clone(),
            mime_type: image.mime_type.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryEntry {
    pub id: String,
    pub prompt: String,
    pub params: VariationParams,
    pub background_image: Option<ImageInfo>,
}

/// What the page sees. Image bytes are fetched separately by slot or id.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateView {
    pub base_image: Option<ImageInfo>,
    pub background_image: Option<ImageInfo>,
    pub uploads_revision: u64,
    pub params: VariationParams,
    pub gallery: Vec<GalleryEntry>,
    pub status: RequestStatus,
    pub in_flight: usize,
}

impl StateView {
    pub fn is_busy(&self) -> bool {
        self.in_flight > 0
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            base_image: None,
            background_image: None,
            params: VariationParams::default(),
            gallery: Gallery::new(),
            status: RequestStatus::Idle,
            in_flight: 0,
            uploads_revision: 0,
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_generating(&self) -> bool {
        self.status == RequestStatus::Generating
    }

    pub fn view(&self) -> StateView {
        StateView {
            base_image: self.base_image.as_ref().map(ImageInfo::from),
            background_image: self.background_image.as_ref().map(ImageInfo::from),
            uploads_revision: self.uploads_revision,
            params: self.params.clone(),
            gallery: self
                .gallery
                .iter()
                .map(|image| GalleryEntry {
                    id: image.id.clone(),
                    prompt: image.prompt.clone(),
                    params: image.params.clone(),
                    background_image: image.background_image.as_ref().map(ImageInfo::from),
                })
                .collect(),
            status: self.status.clone(),
            in_flight: self.in_flight,
        }
    }

    pub fn update(&mut self, message: Message) -> Option<Command> {
        match message {
            Message::BaseImageLoaded(image) => {
                self.base_image = Some(image);
                self.uploads_revision += 1;
                None
            }
            Message::BackgroundImageLoaded(image) => {
                self.background_image = Some(image);
                self.params.background.clear();
                self.uploads_revision += 1;
                None
            }
            Message::BackgroundImageCleared => {
                if self.background_image.take().is_some() {
                    self.uploads_revision += 1;
                }
                None
            }
            Message::ParamChanged(field, value) => {
                if field == ParamField::Background
                    && !value.trim().is_empty()
                    && self.background_image.take().is_some()
                {
                    self.uploads_revision += 1;
                }
                self.params.set(field, value);
                None
            }
            Message::Submit => {
                if self.is_generating() {
                    return None;
                }
                self.start(self.params.clone(), self.background_image.clone())
            }
            Message::Regenerate(id) => {
                let image = self.gallery.get(&id)?;
                let (params, background) = (image.params.clone(), image.background_image.clone());
                self.start(params, background)
            }
            Message::Delete(id) => {
                self.gallery.remove(&id);
                None
            }
            Message::GenerationFinished {
                job,
                result,
                finished_at,
            } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                match result {
                    Ok(data_url) => {
                        let id = self.gallery.next_id(finished_at);
                        self.gallery.prepend(GeneratedImage {
                            id,
                            data_url,
                            prompt: job.prompt,
                            params: job.params,
                            background_image: job.background_image,
                        });
                        self.status = RequestStatus::Idle;
                    }
                    Err(err) => self.status = RequestStatus::Failed(err.to_string()),
                }
                None
            }
            Message::DismissError => {
                if matches!(self.status, RequestStatus::Failed(_)) {
                    self.status = RequestStatus::Idle;
                }
                None
            }
        }
    }

    fn start(
        &mut self,
        params: VariationParams,
        background_image: Option<BaseImage>,
    ) -> Option<Command> {
        let Some(base_image) = self.base_image.clone() else {
            self.status = RequestStatus::Failed(MISSING_BASE_IMAGE_MESSAGE.to_string());
            return None;
        };
        self.status = RequestStatus::Generating;
        self.in_flight += 1;
        Some(Command::Generate(GenerationJob::new(
            base_image,
            params,
            background_image,
        )))
    }
}
