//! Character encoding resolution for fetched pages
//!
//! netkeiba has historically served EUC-JP, but page variants disagree about
//! where (and whether) they declare it. The resolver combines the transport
//! hint, the in-document `<meta>` declaration and a default, decodes, and
//! then checks the result for mojibake before trusting it:
//!
//! 1. Start from the configured default (EUC-JP)
//! 2. A `Content-Type` charset overrides the default
//! 3. A `<meta>` charset in the first 2KB overrides the header
//! 4. Decode, then run [`looks_garbled`]
//! 5. If garbled, try EUC-JP, Shift_JIS, ISO-2022-JP, UTF-8 in turn and keep
//!    the first clean decoding
//! 6. If nothing is clean, keep the step 4 decoding

mod charset;
mod garble;

pub use charset::{
    charset_from_content_type, lookup_charset, normalize_charset, sniff_meta_charset, SNIFF_LIMIT,
};
pub use garble::{is_japanese_char, japanese_ratio, looks_garbled, GarbleThresholds};

use crate::config::EncodingConfig;
use crate::ConfigError;
use encoding_rs::{Encoding, EUC_JP, ISO_2022_JP, SHIFT_JIS, UTF_8};
use reqwest::header::{HeaderMap, CONTENT_TYPE};

/// Encodings retried, in order, when the first decoding looks garbled
pub fn alternative_encodings() -> [&'static Encoding; 4] {
    [EUC_JP, SHIFT_JIS, ISO_2022_JP, UTF_8]
}

/// Transport-level metadata that may carry a charset
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportHints {
    /// Raw `Content-Type` header value
    pub content_type: Option<String>,
}

impl TransportHints {
    /// Hints carrying only a `Content-Type` value
    pub fn content_type(value: impl Into<String>) -> Self {
        Self {
            content_type: Some(value.into()),
        }
    }

    /// Collects hints from HTTP response headers
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            content_type: headers
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        }
    }

    /// The charset named by the `Content-Type` hint, if any
    pub fn charset(&self) -> Option<String> {
        self.content_type
            .as_deref()
            .and_then(charset_from_content_type)
    }
}

/// Outcome of decoding a page body
#[derive(Debug, Clone)]
pub struct DecodedText {
    /// The decoded text
    pub text: String,

    /// Encoding that produced `text`
    pub encoding: &'static Encoding,

    /// Number of alternative encodings attempted after the first decoding
    pub alternatives_tried: usize,
}

/// Decodes page bytes using declared charsets plus a mojibake check
#[derive(Debug, Clone)]
pub struct EncodingResolver {
    default: &'static Encoding,
    thresholds: GarbleThresholds,
}

impl Default for EncodingResolver {
    fn default() -> Self {
        Self::new(EUC_JP, GarbleThresholds::default())
    }
}

impl EncodingResolver {
    /// Creates a resolver with an explicit default encoding and thresholds
    pub fn new(default: &'static Encoding, thresholds: GarbleThresholds) -> Self {
        Self {
            default,
            thresholds,
        }
    }

    /// Creates a resolver from the `[encoding]` configuration section
    pub fn from_config(config: &EncodingConfig) -> Result<Self, ConfigError> {
        let default = lookup_charset(&config.default)
            .ok_or_else(|| ConfigError::UnknownEncoding(config.default.clone()))?;

        Ok(Self::new(
            default,
            GarbleThresholds {
                min_japanese_ratio: config.min_japanese_ratio,
                min_sample_chars: config.min_sample_chars,
            },
        ))
    }

    pub fn thresholds(&self) -> &GarbleThresholds {
        &self.thresholds
    }

    /// Picks the encoding to try first
    ///
    /// A `<meta>` declaration beats the transport hint, which beats the
    /// default. A declaration naming an unknown charset is skipped.
    pub fn detect(&self, bytes: &[u8], hints: &TransportHints) -> &'static Encoding {
        let declared = [
            ("document", sniff_meta_charset(bytes)),
            ("transport", hints.charset()),
        ];

        for (source, name) in declared {
            let Some(name) = name else { continue };
            match lookup_charset(&name) {
                Some(encoding) => {
                    tracing::debug!("Using {} charset from {} declaration", encoding.name(), source);
                    return encoding;
                }
                None => {
                    tracing::debug!("Ignoring unknown {} charset '{}'", source, name);
                }
            }
        }

        self.default
    }

    /// Decodes `bytes` into text
    ///
    /// Never fails: when every candidate looks garbled, the decoding under the
    /// detected encoding is returned as a best effort.
    pub fn resolve(&self, bytes: &[u8], hints: &TransportHints) -> DecodedText {
        let primary = self.detect(bytes, hints);
        let (text, had_errors) = primary.decode_without_bom_handling(bytes);

        if !had_errors && !looks_garbled(&text, &self.thresholds) {
            return DecodedText {
                text: text.into_owned(),
                encoding: primary,
                alternatives_tried: 0,
            };
        }

        tracing::debug!(
            "Text decoded as {} looks garbled, trying alternatives",
            primary.name()
        );

        let mut alternatives_tried = 0;
        for alternative in alternative_encodings().into_iter().filter(|&e| e != primary) {
            alternatives_tried += 1;

            // Malformed input for this encoding: move on to the next one
            let Some(candidate) = alternative.decode_without_bom_handling_and_without_replacement(bytes)
            else {
                continue;
            };

            if !looks_garbled(&candidate, &self.thresholds) {
                tracing::debug!("Re-decoded as {}", alternative.name());
                return DecodedText {
                    text: candidate.into_owned(),
                    encoding: alternative,
                    alternatives_tried,
                };
            }
        }

        tracing::warn!(
            "No alternative encoding produced clean text, keeping {}",
            primary.name()
        );

        DecodedText {
            text: text.into_owned(),
            encoding: primary,
            alternatives_tried,
        }
    }
}
