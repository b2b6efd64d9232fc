use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::options::{
    ASPECT_RATIO_OPTIONS, CAMERA_SHOT_OPTIONS, FACE_OPTIONS, STYLE_OPTIONS, aspect_ratio_token,
};

/// Edit parameters collected by the form. Every field is free text on the
/// wire; the option catalogs only seed the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VariationParams {
    pub face: String,
    pub hands: String,
    pub clothing: String,
    pub background: String,
    pub text: String,
    pub text_position: String,
    pub aspect_ratio: String,
    pub style: String,
    pub camera_shot: String,
    pub observations: String,
}

impl Default for VariationParams {
    fn default() -> Self {
        Self {
            face: FACE_OPTIONS[0].to_string(),
            hands: String::new(),
            clothing: String::new(),
            background: String::new(),
            text: String::new(),
            text_position: String::new(),
            aspect_ratio: ASPECT_RATIO_OPTIONS[0].to_string(),
            style: STYLE_OPTIONS[0].to_string(),
            camera_shot: CAMERA_SHOT_OPTIONS[0].value.to_string(),
            observations: String::new(),
        }
    }
}

impl VariationParams {
    pub fn set(&mut self, field: ParamField, value: impl Into<String>) {
        let value = value.into();
        match field {
            ParamField::Face => self.face = value,
            ParamField::Hands => self.hands = value,
            ParamField::Clothing => self.clothing = value,
            ParamField::Background => self.background = value,
            ParamField::Text => self.text = value,
            ParamField::TextPosition => self.text_position = value,
            ParamField::AspectRatio => self.aspect_ratio = value,
            ParamField::Style => self.style = value,
            ParamField::CameraShot => self.camera_shot = value,
            ParamField::Observations => self.observations = value,
        }
    }

    pub fn get(&self, field: ParamField) -> &str {
        match field {
            ParamField::Face => &self.face,
            ParamField::Hands => &self.hands,
            ParamField::Clothing => &self.clothing,
            ParamField::Background => &self.background,
            ParamField::Text => &self.text,
            ParamField::TextPosition => &self.text_position,
            ParamField::AspectRatio => &self.aspect_ratio,
            ParamField::Style => &self.style,
            ParamField::CameraShot => &self.camera_shot,
            ParamField::Observations => &self.observations,
        }
    }

    pub fn ratio(&self) -> &str {
        aspect_ratio_token(&self.aspect_ratio)
    }
}

/// Names a single form field, using the same camelCase names as the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParamField {
    Face,
    Hands,
    Clothing,
    Background,
    Text,
    TextPosition,
    AspectRatio,
    Style,
    CameraShot,
    Observations,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown form field: {0}")]
pub struct UnknownField(pub String);

impl FromStr for ParamField {
    type Err = UnknownField;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let field = match value {
            "face" => Self::Face,
            "hands" => Self::Hands,
            "clothing" => Self::Clothing,
            "background" => Self::Background,
            "text" => Self::Text,
            "textPosition" => Self::TextPosition,
            "aspectRatio" => Self::AspectRatio,
            "style" => Self::Style,
            "cameraShot" => Self::CameraShot,
            "observations" => Self::Observations,
            other => return Err(UnknownField(other.to_string())),
        };
        Ok(field)
    }
}
