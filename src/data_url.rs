//! Data URLs and the uploaded images that carry them.

use std::fmt;

use axum::body::Bytes;
use axum::extract::multipart::Field;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::image_processing;
use crate::options::ACCEPTED_IMAGE_TYPES;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DataUrlError {
    #[error("not a data URL")]
    MissingScheme,
    #[error("data URL has no payload separator")]
    MissingPayload,
    #[error("data URL is not base64 encoded")]
    NotBase64,
    #[error("invalid base64 payload: {0}")]
    Decode(String),
}

/// A `data:<mime>;base64,<payload>` value split into its two halves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    mime_type: String,
    payload: String,
}

impl DataUrl {
    pub fn new(mime_type: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            payload: payload.into(),
        }
    }

    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self::new(mime_type, STANDARD.encode(bytes))
    }

    pub fn parse(raw: &str) -> Result<Self, DataUrlError> {
        let rest = raw.strip_prefix("data:").ok_or(DataUrlError::MissingScheme)?;
        let (header, payload) = rest.split_once(',').ok_or(DataUrlError::MissingPayload)?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or(DataUrlError::NotBase64)?;
        Ok(Self::new(mime_type, payload))
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// The base64 payload without the `data:` header.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn decode_bytes(&self) -> Result<Vec<u8>, DataUrlError> {
        STANDARD
            .decode(&self.payload)
            .map_err(|err| DataUrlError::Decode(err.to_string()))
    }
}

impl fmt::Display for DataUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data:{};base64,{}", self.mime_type, self.payload)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("no file was uploaded")]
    Missing,
    #[error("uploaded file is empty")]
    Empty,
    #[error("unsupported image type: {0} (accepted: PNG, JPEG, WEBP)")]
    UnsupportedType(String),
    #[error("failed to read upload: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),
}

/// An uploaded image kept alongside its data URL. Replaced wholesale when
/// its slot receives a new upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseImage {
    pub file_name: String,
    pub mime_type: String,
    pub data_url: String,
}

impl BaseImage {
    /// Converts raw upload bytes. The declared type wins when it is one of the
    /// accepted types; otherwise the type is sniffed from the payload.
    pub fn from_upload(
        file_name: impl Into<String>,
        declared_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<Self, UploadError> {
        if bytes.is_empty() {
            return Err(UploadError::Empty);
        }
        let declared = declared_type
            .map(|value| value.split(';').next().unwrap_or(value).trim().to_lowercase())
            .map(|value| if value == "image/jpg" { "image/jpeg".to_string() } else { value });
        let mime_type = match declared {
            Some(value) if ACCEPTED_IMAGE_TYPES.contains(&value.as_str()) => value,
            other => match image_processing::detect_mime_type(bytes) {
                Some(sniffed) => sniffed.to_string(),
                None => {
                    return Err(UploadError::UnsupportedType(
                        other.unwrap_or_else(|| "unknown".to_string()),
                    ));
                }
            },
        };
        Ok(Self {
            file_name: file_name.into(),
            data_url: DataUrl::from_bytes(&mime_type, bytes).to_string(),
            mime_type,
        })
    }

    /// Reads one multipart field to completion and converts it.
    pub async fn from_multipart(field: Field<'_>) -> Result<Upload, UploadError> {
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;
        let image = Self::from_upload(file_name, content_type.as_deref(), &bytes)?;
        Ok(Upload { image, bytes })
    }

    /// The data URL split into media type and payload. Falls back to the
    /// slot's recorded type when the stored URL cannot be parsed.
    pub fn inline_data(&self) -> DataUrl {
        DataUrl::parse(&self.data_url).unwrap_or_else(|_| {
            let payload = self
                .data_url
                .split_once(',')
                .map(|(_, payload)| payload)
                .unwrap_or_default();
            DataUrl::new(&self.mime_type, payload)
        })
    }
}

/// A converted upload with the raw bytes it was built from.
#[derive(Debug, Clone)]
pub struct Upload {
    pub image: BaseImage,
    pub bytes: Bytes,
}

impl Upload {
    /// True when the image header reports a side below the recommended size.
    pub fn is_below_recommended_size(&self) -> bool {
        image_processing::is_below_recommended_size(&self.bytes, &self.image.mime_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_processing::png_bytes;

    #[test]
    fn parse_splits_type_and_payload() {
        let url = DataUrl::parse("data:image/png;base64,iVBORw0KGgo=").unwrap();
        assert_eq!(url.mime_type(), "image/png");
        assert_eq!(url.payload(), "iVBORw0KGgo=");
        assert_eq!(url.to_string(), "data:image/png;base64,iVBORw0KGgo=");
    }

    #[test]
    fn parse_rejects_malformed_urls() {
        assert_eq!(DataUrl::parse("image/png;base64,AAAA"), Err(DataUrlError::MissingScheme));
        assert_eq!(DataUrl::parse("data:image/png;base64"), Err(DataUrlError::MissingPayload));
        assert_eq!(DataUrl::parse("data:text/plain,hello"), Err(DataUrlError::NotBase64));
    }

    #[test]
    fn decode_bytes_returns_original_content() {
        let url = DataUrl::from_bytes("image/png", b"\x89PNG");
        assert_eq!(url.decode_bytes().unwrap(), b"\x89PNG");
        assert!(DataUrl::new("image/png", "***").decode_bytes().is_err());
    }

    #[test]
    fn upload_keeps_declared_accepted_type() {
        let image = BaseImage::from_upload("face.png", Some("image/png"), &png_bytes(2, 2)).unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert!(image.data_url.starts_with("data:image/png;base64,"));
        assert_eq!(image.inline_data().mime_type(), "image/png");
    }

    #[test]
    fn upload_size_check_reads_raw_bytes() {
        let bytes = Bytes::from(png_bytes(2, 2));
        let image = BaseImage::from_upload("face.png", Some("image/png"), &bytes).unwrap();
        let upload = Upload { image, bytes };
        assert!(upload.is_below_recommended_size());

        let bytes = Bytes::from_static(b"not a png");
        let upload = Upload {
            image: BaseImage::from_upload("face.png", Some("image/png"), &bytes).unwrap(),
            bytes,
        };
        assert!(!upload.is_below_recommended_size());
    }

    #[test]
    fn upload_sniffs_when_declared_type_is_generic() {
        let image = BaseImage::from_upload(
            "face",
            Some("application/octet-stream"),
            &png_bytes(2, 2),
        )
        .unwrap();
        assert_eq!(image.mime_type, "image/png");
    }

    #[test]
    fn upload_normalizes_jpg_alias() {
        let image = BaseImage::from_upload("a.jpg", Some("image/jpg"), &[0xFF, 0xD8, 0xFF]).unwrap();
        assert_eq!(image.mime_type, "image/jpeg");
    }

    #[test]
    fn upload_rejects_empty_and_unsupported_files() {
        assert!(matches!(
            BaseImage::from_upload("a.png", Some("image/png"), &[]),
            Err(UploadError::Empty)
        ));
        assert!(matches!(
            BaseImage::from_upload("a.gif", Some("image/gif"), b"GIF89a...."),
            Err(UploadError::UnsupportedType(kind)) if kind == "image/gif"
        ));
    }
}
