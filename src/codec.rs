//! Shareable configuration links.
//!
//! A [`GenerationConfig`] travels as a flat `key=value&...` token string:
//!
//! | key          | value                                         |
//! |--------------|-----------------------------------------------|
//! | `prompt`     | base64 of the system prompt                   |
//! | `variations` | integer                                       |
//! | `quality`    | `low`, `medium`, `high` or `auto`             |
//! | `size`       | `1024x1024`, `1024x1536`, `1536x1024`, `auto` |
//! | `books`      | base64 of the `|`-joined titles, omitted when empty |
//!
//! Every value is percent-encoded. Decoding is permissive: a field that
//! fails to decode falls back to its own default and never spoils the
//! others.

use crate::error::CoverError;
use crate::models::{GenerationConfig, ImageQuality, ImageSize, PartialConfig};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use url::form_urlencoded;

pub const KEY_PROMPT: &str = "prompt";
pub const KEY_VARIATIONS: &str = "variations";
pub const KEY_QUALITY: &str = "quality";
pub const KEY_SIZE: &str = "size";
pub const KEY_BOOKS: &str = "books";

const TITLE_SEPARATOR: char = '|';

/// Value used for `variations` when the shared value is not an integer.
pub const FALLBACK_VARIATIONS: u8 = 1;

pub fn encode(config: &GenerationConfig) -> String {
    let mut params: Vec<(&str, String)> = vec![
        (KEY_PROMPT, STANDARD.encode(config.system_prompt.as_bytes())),
        (KEY_VARIATIONS, config.variation_count.to_string()),
        (KEY_QUALITY, config.image_quality.to_string()),
        (KEY_SIZE, config.image_size.to_string()),
    ];

    if !config.book_titles.is_empty() {
        let joined = config.book_titles.join(&TITLE_SEPARATOR.to_string());
        params.push((KEY_BOOKS, STANDARD.encode(joined.as_bytes())));
    }

    params
        .iter()
        .map(|(key, value)| format!("{}={}", key, percent_encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Decode a token string. Accepts bare tokens, a leading `?`, or a full URL.
pub fn decode(tokens: &str) -> PartialConfig {
    let query = match tokens.split_once('?') {
        Some((_, query)) => query,
        None => tokens,
    };
    let query = query.split('#').next().unwrap_or_default();

    decode_pairs(
        form_urlencoded::parse(query.as_bytes()).map(|(k, v)| (k.into_owned(), v.into_owned())),
    )
}

/// Decode already-split key/value pairs, e.g. query parameters handed over by a web framework.
pub fn decode_pairs<I, K, V>(pairs: I) -> PartialConfig
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut config = PartialConfig::default();

    for (key, value) in pairs {
        let value = value.as_ref();
        match key.as_ref() {
            KEY_PROMPT => {
                config.system_prompt = recover(KEY_PROMPT, decode_text(KEY_PROMPT, value), None);
            }
            KEY_VARIATIONS => {
                let count = recover(
                    KEY_VARIATIONS,
                    decode_variations(value).map(Some),
                    Some(FALLBACK_VARIATIONS),
                );
                config.variation_count = count;
            }
            KEY_QUALITY => {
                config.image_quality =
                    recover(KEY_QUALITY, value.parse::<ImageQuality>().map(Some), None);
            }
            KEY_SIZE => {
                config.image_size = recover(KEY_SIZE, value.parse::<ImageSize>().map(Some), None);
            }
            KEY_BOOKS => {
                let titles = recover(
                    KEY_BOOKS,
                    decode_text(KEY_BOOKS, value).map(|joined| joined.map(split_titles)),
                    Some(Vec::new()),
                );
                config.book_titles = titles;
            }
            other => log::debug!("Ignoring unrecognized share key '{}'", other),
        }
    }

    config
}

/// `<base_url>?<tokens>`
pub fn share_url(base_url: &str, config: &GenerationConfig) -> String {
    format!("{}?{}", base_url.trim_end_matches('?'), encode(config))
}

fn percent_encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

fn recover<T>(field: &str, result: Result<T, CoverError>, fallback: T) -> T {
    result.unwrap_or_else(|e| {
        log::warn!("Shared '{}' could not be decoded, using default: {}", field, e);
        fallback
    })
}

/// A link pasted through a form decoder turns '+' into ' '. Base64 never
/// contains spaces, so map them back before stripping line noise.
fn repair_base64(value: &str) -> String {
    value
        .chars()
        .map(|c| if c == ' ' { '+' } else { c })
        .collect::<String>()
        .trim_matches(['\r', '\n', '\t'])
        .to_string()
}

fn decode_text(field: &'static str, value: &str) -> Result<Option<String>, CoverError> {
    let bytes = STANDARD
        .decode(repair_base64(value).as_bytes())
        .map_err(|e| CoverError::ConfigDecode {
            field,
            reason: e.to_string(),
        })?;

    String::from_utf8(bytes)
        .map(Some)
        .map_err(|e| CoverError::ConfigDecode {
            field,
            reason: e.to_string(),
        })
}

fn decode_variations(value: &str) -> Result<u8, CoverError> {
    value
        .trim()
        .parse::<i64>()
        .map(crate::models::clamp_variations)
        .map_err(|e| CoverError::ConfigDecode {
            field: KEY_VARIATIONS,
            reason: e.to_string(),
        })
}

fn split_titles(joined: String) -> Vec<String> {
    if joined.is_empty() {
        return Vec::new();
    }
    joined.split(TITLE_SEPARATOR).map(String::from).collect()
}
