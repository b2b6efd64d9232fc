//! Errors surfaced to the person using the form.

/// Shown when the API credential is missing.
pub const MISSING_CREDENTIAL_MESSAGE: &str = "API_KEY environment variable is not set.";

/// Shown for every upstream failure. Details go to the log only.
pub const GENERATION_FAILED_MESSAGE: &str =
    "Failed to generate image. Please check the console for details.";

/// Shown when the form is submitted before a base image is uploaded.
pub const MISSING_BASE_IMAGE_MESSAGE: &str = "Por favor, sube una imagen base primero.";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    /// No credential configured. Raised before any network attempt.
    #[error("{}", MISSING_CREDENTIAL_MESSAGE)]
    MissingCredential,

    /// Transport, service or response failure, collapsed to one message.
    #[error("{}", GENERATION_FAILED_MESSAGE)]
    Failed,
}

pub type GenerationResult<T> = std::result::Result<T, GenerationError>;
