use serde::Deserialize;
use std::env;

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

/// Knobs for the merge/filter/chunk pipeline.
///
/// `min_text_chars` applies only to standalone text chunks, never to merged
/// or table-derived chunks. `token_estimate_factor` drives the character-based
/// token estimate used when no exact tokenizer is available.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessingConfig {
    pub min_text_chars: usize,
    pub token_estimate_factor: f32,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            min_text_chars: 30,
            token_estimate_factor: 1.5,
        }
    }
}

impl ProcessingConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            min_text_chars: parse_env_or("CHUNKMILL_MIN_TEXT_CHARS", defaults.min_text_chars),
            token_estimate_factor: parse_env_or(
                "CHUNKMILL_TOKEN_ESTIMATE_FACTOR",
                defaults.token_estimate_factor,
            ),
        }
    }
}
