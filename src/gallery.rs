use chrono::{DateTime, SecondsFormat, Utc};
use crate::data_url::{BaseImage, DataUrl, DataUrlError};
use crate::params::VariationParams;

const DOWNLOAD_SLUG: &str = "variacion";
const FALLBACK_RATIO: &str = "custom";

/// A finished generation. Never edited after creation; regenerating makes a
/// new entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub id: String,
    pub data_url: String,
    pub prompt: String,
    pub params: VariationParams,
    pub background_image: Option<BaseImage>,
}

pub struct Download {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Past results, newest first.
#[derive(Debug, Clone, Default)]
pub struct Gallery {
    images: Vec<GeneratedImage>,
}

impl Gallery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GeneratedImage> {
        self.images.iter()
    }

    pub fn get(&self, id: &str) -> Option<&GeneratedImage> {
        self.images.iter().find(|image| image.id == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.images.iter().position(|image| image.id == id)
    }

    pub fn prepend(&mut self, image: GeneratedImage) {
        self.images.insert(0, image);
    }

    /// Returns false when nothing matched; the list is left as it was.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.images.len();
        self.images.retain(|image| image.id != id);
        self.images.len() != before
    }

    /// An ISO-8601 timestamp, suffixed when two results land on the same
    /// millisecond.
    pub fn next_id(&self, now: DateTime<Utc>) -> String {
        let stamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);
        if self.get(&stamp).is_none() {
            return stamp;
        }
        (2..)
            .map(|n| format!("{stamp}-{n}"))
            .find(|candidate| self.get(candidate).is_none())
            .unwrap_or(stamp)
    }

    /// `variacion_<sequence>_web_<W>x<H>.png`, where the oldest entry is 1.
    /// The name ends up in a header, so only `[0-9A-Za-z._-]` survive from a
    /// free-text ratio.
    pub fn download_name(&self, index: usize, params: &VariationParams) -> String {
        let sequence = self.images.len().saturating_sub(index);
        let ratio = file_name_ratio(params.ratio());
        format!("{DOWNLOAD_SLUG}_{sequence}_web_{ratio}.png")
    }

    pub fn download(&self, id: &str) -> Option<Result<Download, DataUrlError>> {
        let index = self.position(id)?;
        let image = &self.images[index];
        let file_name = self.download_name(index, &image.params);
        Some(DataUrl::parse(&image.data_url).and_then(|url| {
            Ok(Download {
                file_name,
                mime_type: url.mime_type().to_string(),
                bytes: url.decode_bytes()?,
            })
        }))
    }
}

fn file_name_ratio(ratio: &str) -> String {
    let token: String = ratio
        .chars()
        .filter_map(|c| match c {
            ':' => Some('x'),
            c if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') => Some(c),
            _ => None,
        })
        .collect();
    if token.is_empty() {
        FALLBACK_RATIO.to_string()
    } else {
        token
    }
}
