//! Text form of lazy references
//!
//! ```text
//! chunk#symbol[hash]:capture1:capture2
//! ```
//!
//! `[hash]` is present only when the hash differs from the symbol. The
//! chunk may not contain `#`; the symbol may not contain `#`, `:`, `[` or
//! `]`; capture keys are non-empty and may not contain `:`.

use std::sync::Arc;

use serde::{de, ser, Deserialize, Deserializer, Serialize, Serializer};

use super::Qrl;
use crate::error::QrlError;
use crate::platform::Platform;
use crate::value::Value;

/// Maps a captured value to its serialized key.
pub type ObjIdFn = Arc<dyn Fn(&Value) -> Option<String> + Send + Sync>;

/// Options for [`stringify_qrl`].
#[derive(Clone, Default)]
pub struct SerializeOptions {
    /// Platform consulted for bundled symbol locations
    pub platform: Option<Arc<dyn Platform>>,

    /// Key lookup used when a reference carries capture values but no keys
    pub get_obj_id: Option<ObjIdFn>,
}

impl SerializeOptions {
    /// Options with no platform and no key lookup
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style platform
    pub fn with_platform(mut self, platform: Arc<dyn Platform>) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Builder-style key lookup
    pub fn with_obj_id<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> Option<String> + Send + Sync + 'static,
    {
        self.get_obj_id = Some(Arc::new(f));
        self
    }
}

fn invalid(input: &str, reason: impl Into<String>) -> QrlError {
    QrlError::InvalidFormat {
        input: input.to_string(),
        reason: reason.into(),
    }
}

/// Render `qrl` in text form.
///
/// # Errors
///
/// Returns `InvalidFormat` if a component contains a reserved character or
/// a captured value has no key.
pub fn stringify_qrl(qrl: &Qrl, options: &SerializeOptions) -> Result<String, QrlError> {
    let mut chunk = qrl.chunk().to_string();
    let mut symbol = qrl.symbol().to_string();

    if let Some(platform) = &options.platform {
        if let Some((bundled_symbol, bundled_chunk)) = platform.chunk_for_symbol(qrl.get_symbol()) {
            chunk = bundled_chunk;
            if qrl.ref_symbol().is_none() {
                symbol = bundled_symbol;
            }
        }
    }

    if chunk.contains('#') {
        return Err(invalid(&chunk, "chunk may not contain '#'"));
    }
    if symbol.is_empty() {
        return Err(invalid(&chunk, "symbol is empty"));
    }
    if symbol.contains(['#', ':', '[', ']']) {
        return Err(invalid(&symbol, "symbol may not contain '#', ':', '[' or ']'"));
    }

    let mut out = format!("{chunk}#{symbol}");
    let hash = qrl.get_hash();
    if hash != symbol {
        if hash.contains([':', '[', ']']) {
            return Err(invalid(hash, "hash may not contain ':', '[' or ']'"));
        }
        out.push('[');
        out.push_str(hash);
        out.push(']');
    }

    let mut capture = qrl.capture();
    if capture.is_empty() {
        if let Some(get_obj_id) = &options.get_obj_id {
            capture = qrl
                .capture_values()
                .iter()
                .enumerate()
                .map(|(index, value)| {
                    get_obj_id(value)
                        .ok_or_else(|| invalid(&out, format!("captured value #{index} has no id")))
                })
                .collect::<Result<_, _>>()?;
        }
    }
    for key in &capture {
        if key.is_empty() || key.contains(':') {
            return Err(invalid(key, "capture keys must be non-empty and may not contain ':'"));
        }
        out.push(':');
        out.push_str(key);
    }

    Ok(out)
}

/// Parse the text form back into an unresolved reference.
///
/// # Errors
///
/// Returns `InvalidFormat` if `input` does not follow the text form.
pub fn parse_qrl(input: &str) -> Result<Qrl, QrlError> {
    let (chunk, rest) = input
        .split_once('#')
        .ok_or_else(|| invalid(input, "missing '#'"))?;

    let mut parts = rest.split(':');
    let head = parts.next().unwrap_or_default();
    let capture: Vec<&str> = parts.collect();
    if capture.iter().any(|key| key.is_empty()) {
        return Err(invalid(input, "empty capture key"));
    }

    let (symbol, hash) = match head.split_once('[') {
        Some((symbol, tail)) => {
            let hash = tail
                .strip_suffix(']')
                .ok_or_else(|| invalid(input, "unterminated hash"))?;
            if hash.contains(['[', ']']) {
                return Err(invalid(input, "malformed hash"));
            }
            (symbol, hash)
        }
        None => (head, head),
    };
    if symbol.is_empty() {
        return Err(invalid(input, "symbol is empty"));
    }
    if symbol.contains(['#', ']']) {
        return Err(invalid(input, "symbol may not contain '#' or ']'"));
    }

    Qrl::builder(chunk, symbol)
        .hash(hash)
        .capture(capture)
        .build()
}

impl Qrl {
    /// Render in text form; see [`stringify_qrl`].
    pub fn serialize(&self, options: &SerializeOptions) -> Result<String, QrlError> {
        stringify_qrl(self, options)
    }

    /// Parse the text form; see [`parse_qrl`].
    pub fn parse(input: &str) -> Result<Qrl, QrlError> {
        parse_qrl(input)
    }
}

impl Serialize for Qrl {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let text = stringify_qrl(self, &SerializeOptions::default()).map_err(ser::Error::custom)?;
        serializer.serialize_str(&text)
    }
}

impl<'de> Deserialize<'de> for Qrl {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse_qrl(&text).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_omitted_when_equal_to_symbol() {
        let qrl = Qrl::new("c.js", "bar");
        assert_eq!(qrl.serialize(&SerializeOptions::new()).unwrap(), "c.js#bar");
    }

    #[test]
    fn test_parse_restores_parts() {
        let qrl = parse_qrl("c1.js#foo_AB12[AB12]:0:1").unwrap();
        assert_eq!(qrl.chunk(), "c1.js");
        assert_eq!(qrl.symbol(), "foo_AB12");
        assert_eq!(qrl.get_hash(), "AB12");
        assert_eq!(qrl.capture(), vec!["0".to_string(), "1".to_string()]);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for input in ["no-hash-sign", "c.js#", "c.js#sym[h", "c.js#sym::x", "c.js#s]", "a#b#c"] {
            assert!(parse_qrl(input).is_err(), "accepted {input:?}");
        }
    }

    #[test]
    fn test_reserved_characters_rejected() {
        let qrl = Qrl::new("a#b", "s");
        assert!(matches!(
            qrl.serialize(&SerializeOptions::new()),
            Err(QrlError::InvalidFormat { .. })
        ));
        let qrl = Qrl::builder("c.js", "s").capture(["a:b"]).build().unwrap();
        assert!(qrl.serialize(&SerializeOptions::new()).is_err());
    }
}
