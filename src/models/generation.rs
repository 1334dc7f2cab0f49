use crate::error::CoverError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const MIN_VARIATIONS: u8 = 1;
pub const MAX_VARIATIONS: u8 = 5;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a skilled book cover designer specializing in simple, cartoonish art styles.
Create descriptions for book covers with a minimalist, flat design aesthetic using simple shapes, clean lines,
and solid background colors. Focus on creating playful, cartoonish imagery with limited detail.
Your descriptions should specify:
- Simple character or object illustrations with minimal details
- Flat design with limited or no shading
- Bold, solid color backgrounds
- Clean, simple line art
- Minimalist composition focusing on a single central element or character
- A modern, playful aesthetic suitable for all audiences
Keep the description between 80-120 words.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageQuality {
    Low,
    #[default]
    Medium,
    High,
    Auto,
}

impl ImageQuality {
    pub const ALL: [ImageQuality; 4] = [
        ImageQuality::Low,
        ImageQuality::Medium,
        ImageQuality::High,
        ImageQuality::Auto,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageQuality::Low => "low",
            ImageQuality::Medium => "medium",
            ImageQuality::High => "high",
            ImageQuality::Auto => "auto",
        }
    }
}

impl fmt::Display for ImageQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageQuality {
    type Err = CoverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|q| q.as_str() == s.trim())
            .ok_or_else(|| {
                CoverError::ConfigError(format!(
                    "unknown image quality '{}' (expected low, medium, high or auto)",
                    s
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImageSize {
    #[default]
    #[serde(rename = "1024x1024")]
    Square,
    #[serde(rename = "1024x1536")]
    Portrait,
    #[serde(rename = "1536x1024")]
    Landscape,
    #[serde(rename = "auto")]
    Auto,
}

impl ImageSize {
    pub const ALL: [ImageSize; 4] = [
        ImageSize::Square,
        ImageSize::Portrait,
        ImageSize::Landscape,
        ImageSize::Auto,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::Square => "1024x1024",
            ImageSize::Portrait => "1024x1536",
            ImageSize::Landscape => "1536x1024",
            ImageSize::Auto => "auto",
        }
    }

    /// Width and height in pixels, `None` when the provider should choose.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match self {
            ImageSize::Square => Some((1024, 1024)),
            ImageSize::Portrait => Some((1024, 1536)),
            ImageSize::Landscape => Some((1536, 1024)),
            ImageSize::Auto => None,
        }
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageSize {
    type Err = CoverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|size| size.as_str() == s.trim())
            .ok_or_else(|| {
                CoverError::ConfigError(format!(
                    "unknown image size '{}' (expected 1024x1024, 1024x1536, 1536x1024 or auto)",
                    s
                ))
            })
    }
}

/// Everything a single run needs. Built once per run and not mutated while it executes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub system_prompt: String,
    pub variation_count: u8,
    pub image_quality: ImageQuality,
    pub image_size: ImageSize,
    pub book_titles: Vec<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        GenerationConfig {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            variation_count: MIN_VARIATIONS,
            image_quality: ImageQuality::default(),
            image_size: ImageSize::default(),
            book_titles: Vec::new(),
        }
    }
}

impl GenerationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_variations(mut self, count: u8) -> Self {
        self.variation_count = clamp_variations(count as i64);
        self
    }

    pub fn with_quality(mut self, quality: ImageQuality) -> Self {
        self.image_quality = quality;
        self
    }

    pub fn with_size(mut self, size: ImageSize) -> Self {
        self.image_size = size;
        self
    }

    pub fn with_titles<I, S>(mut self, titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.book_titles = titles.into_iter().map(Into::into).collect();
        self
    }

    /// Overlay the fields present in `partial` on top of `self`.
    pub fn merge(mut self, partial: PartialConfig) -> Self {
        if let Some(prompt) = partial.system_prompt {
            self.system_prompt = prompt;
        }
        if let Some(count) = partial.variation_count {
            self.variation_count = clamp_variations(count as i64);
        }
        if let Some(quality) = partial.image_quality {
            self.image_quality = quality;
        }
        if let Some(size) = partial.image_size {
            self.image_size = size;
        }
        if let Some(titles) = partial.book_titles {
            self.book_titles = titles;
        }
        self
    }

    /// The prompt actually sent to the text model; blank prompts fall back to the default.
    pub fn effective_system_prompt(&self) -> &str {
        if self.system_prompt.trim().is_empty() {
            DEFAULT_SYSTEM_PROMPT
        } else {
            &self.system_prompt
        }
    }

    pub fn uses_custom_prompt(&self) -> bool {
        self.system_prompt.trim() != DEFAULT_SYSTEM_PROMPT.trim()
            && !self.system_prompt.trim().is_empty()
    }

    /// Titles are not part of this comparison.
    pub fn differs_from(&self, other: &GenerationConfig) -> bool {
        self.system_prompt.trim() != other.system_prompt.trim()
            || self.variation_count != other.variation_count
            || self.image_quality != other.image_quality
            || self.image_size != other.image_size
    }
}

/// A configuration with holes, as produced by a shared link or by explicit user input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variation_count: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_quality: Option<ImageQuality>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_size: Option<ImageSize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub book_titles: Option<Vec<String>>,
}

impl PartialConfig {
    pub fn is_empty(&self) -> bool {
        *self == PartialConfig::default()
    }
}

pub fn clamp_variations(count: i64) -> u8 {
    count.clamp(MIN_VARIATIONS as i64, MAX_VARIATIONS as i64) as u8
}

/// Split a free-text block into titles: one per line, trimmed, blank lines dropped.
pub fn parse_titles(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}
