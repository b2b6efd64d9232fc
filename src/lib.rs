pub mod config;
pub mod data_url;
pub mod error;
pub mod gallery;
pub mod gemini;
pub mod image_processing;
pub mod options;
pub mod params;
pub mod prompt;
pub mod state;
pub mod studio;
pub mod web_pages;
