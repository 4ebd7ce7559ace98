use std::sync::Once;

use crate::config::ProcessingConfig;
use crate::models::TokenCount;

/// Token counting contract shared by the exact tokenizer and the fallback
/// estimator, so swapping implementations changes no other component.
pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> TokenCount;
}

/// Character-based approximation for when no subword tokenizer is available.
/// Calibrated for Korean-heavy text, where one character averages roughly
/// 1.5 subword tokens. Results are flagged as estimates.
pub struct CharEstimateCounter {
    factor: f32,
    fallback_warning: Once,
}

impl CharEstimateCounter {
    pub fn new(config: &ProcessingConfig) -> Self {
        Self {
            factor: config.token_estimate_factor,
            fallback_warning: Once::new(),
        }
    }
}

impl Default for CharEstimateCounter {
    fn default() -> Self {
        Self::new(&ProcessingConfig::default())
    }
}

impl TokenCounter for CharEstimateCounter {
    fn count(&self, text: &str) -> TokenCount {
        self.fallback_warning.call_once(|| {
            tracing::warn!(
                factor = self.factor,
                "Exact tokenizer unavailable; token counts are character-based estimates"
            );
        });
        let chars = text.chars().count();
        TokenCount::Estimated((chars as f32 * self.factor).ceil() as usize)
    }
}

/// Exact subword counting through tiktoken's cl100k vocabulary.
#[cfg(feature = "tiktoken")]
pub struct TiktokenCounter {
    bpe: tiktoken_rs::CoreBPE,
}

#[cfg(feature = "tiktoken")]
impl TiktokenCounter {
    pub fn new() -> crate::error::Result<Self> {
        let bpe = tiktoken_rs::cl100k_base()
            .map_err(|e| crate::error::ChunkmillError::Tokenizer(e.to_string()))?;
        Ok(Self { bpe })
    }
}

#[cfg(feature = "tiktoken")]
impl TokenCounter for TiktokenCounter {
    fn count(&self, text: &str) -> TokenCount {
        TokenCount::Exact(self.bpe.encode_with_special_tokens(text).len())
    }
}

/// Best counter the build supports: tiktoken when the feature is enabled and
/// the vocabulary loads, otherwise the character estimate.
pub fn default_counter(config: &ProcessingConfig) -> std::sync::Arc<dyn TokenCounter> {
    #[cfg(feature = "tiktoken")]
    {
        match TiktokenCounter::new() {
            Ok(counter) => return std::sync::Arc::new(counter),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load tiktoken vocabulary, falling back");
            }
        }
    }
    std::sync::Arc::new(CharEstimateCounter::new(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_char_estimate_rounds_up() {
        let counter = CharEstimateCounter::default();
        // 3 chars * 1.5 = 4.5, rounded up to 5.
        assert_eq!(counter.count("가나다"), TokenCount::Estimated(5));
    }

    #[test]
    fn test_char_estimate_counts_chars_not_bytes() {
        let counter = CharEstimateCounter::default();
        // "한글" is 6 bytes but 2 chars.
        assert_eq!(counter.count("한글"), TokenCount::Estimated(3));
    }

    #[test]
    fn test_char_estimate_empty_text() {
        let counter = CharEstimateCounter::default();
        assert_eq!(counter.count(""), TokenCount::Estimated(0));
    }

    #[test]
    fn test_estimate_is_flagged() {
        let counter = CharEstimateCounter::default();
        assert!(counter.count("text").is_estimated());
    }

    #[test]
    fn test_fallback_warning_fires_exactly_once() {
        use std::io::Write;
        use std::sync::{Arc, Mutex};

        #[derive(Clone, Default)]
        struct CapturedLog(Arc<Mutex<Vec<u8>>>);

        impl Write for CapturedLog {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLog {
            type Writer = CapturedLog;

            fn make_writer(&'a self) -> Self::Writer {
                self.clone()
            }
        }

        let log = CapturedLog::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(log.clone())
            .with_ansi(false)
            .finish();

        let counter = CharEstimateCounter::default();
        tracing::subscriber::with_default(subscriber, || {
            counter.count("하나");
            counter.count("둘");
            counter.count("셋");
        });

        let output = String::from_utf8(log.0.lock().unwrap().clone()).unwrap();
        assert_eq!(
            output.matches("character-based estimates").count(),
            1,
            "fallback warning should fire once per counter, not per call"
        );
    }

    #[cfg(feature = "tiktoken")]
    #[test]
    fn test_tiktoken_counts_are_exact() {
        let counter = TiktokenCounter::new().unwrap();
        let count = counter.count("hello world");
        assert!(!count.is_estimated());
        assert!(count.value() > 0);
    }
}
