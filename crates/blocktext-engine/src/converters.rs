//! Data-format converters and negotiation.
//!
//! Converters turn sliced blocks into external representations and back.
//! The registry tries them in a fixed priority order (registration order);
//! a failed deserialization continues with the next lower-priority format
//! rather than aborting, and only total failure surfaces an error, which
//! the engine turns into an explicit failure event so unparsable pasted
//! data reaches the user instead of vanishing.

use serde::{Deserialize, Serialize};

use crate::content::{Block, TextBlock};
use crate::snapshot::Snapshot;

/// One piece of transferable data, tagged with its media type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferItem {
    pub media_type: String,
    pub data: String,
}

impl TransferItem {
    pub fn new(media_type: impl Into<String>, data: impl Into<String>) -> Self {
        TransferItem {
            media_type: media_type.into(),
            data: data.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("no data for media type {media_type}")]
    NoData { media_type: String },
    #[error("{media_type}: {reason}")]
    Parse { media_type: String, reason: String },
    #[error("no converter could read the data: {reasons}")]
    Exhausted { reasons: String },
}

/// A single data format the editor can speak.
pub trait Converter {
    fn media_type(&self) -> &str;

    /// Render `blocks` (a selection slice) into this format.
    fn serialize(&self, snapshot: &Snapshot, blocks: &[Block]) -> Result<String, ConvertError>;

    /// Parse external data into blocks. Must return at least one block.
    fn deserialize(&self, data: &str) -> Result<Vec<Block>, ConvertError>;
}

/// Ordered converter collection. Registration order is negotiation priority:
/// the first registered converter is tried first.
pub struct ConverterRegistry {
    converters: Vec<Box<dyn Converter>>,
}

impl ConverterRegistry {
    pub fn new() -> Self {
        ConverterRegistry {
            converters: Vec::new(),
        }
    }

    /// The stock registry: JSON first, plain text as the fallback format.
    pub fn standard() -> Self {
        let mut registry = ConverterRegistry::new();
        registry.register(Box::new(JsonConverter));
        registry.register(Box::new(TextConverter));
        registry
    }

    pub fn register(&mut self, converter: Box<dyn Converter>) {
        self.converters.push(converter);
    }

    pub fn media_types(&self) -> Vec<&str> {
        self.converters.iter().map(|c| c.media_type()).collect()
    }

    /// Serialize `blocks` into every format that succeeds, in priority
    /// order. Individual converter failures are skipped.
    pub fn serialize_all(&self, snapshot: &Snapshot, blocks: &[Block]) -> Vec<TransferItem> {
        let mut items = Vec::new();
        for converter in &self.converters {
            match converter.serialize(snapshot, blocks) {
                Ok(data) => items.push(TransferItem::new(converter.media_type(), data)),
                Err(err) => {
                    log::debug!("serialize via {} failed: {err}", converter.media_type());
                }
            }
        }
        items
    }

    /// Negotiate a deserialization: walk converters in priority order,
    /// feeding each the item matching its media type. A failure moves on to
    /// the next converter; only exhausting them all is an error.
    pub fn deserialize(&self, items: &[TransferItem]) -> Result<Vec<Block>, ConvertError> {
        let mut reasons = Vec::new();
        for converter in &self.converters {
            let Some(item) = items.iter().find(|i| i.media_type == converter.media_type())
            else {
                continue;
            };
            match converter.deserialize(&item.data) {
                Ok(blocks) if !blocks.is_empty() => return Ok(blocks),
                Ok(_) => reasons.push(format!("{}: produced no blocks", converter.media_type())),
                Err(err) => {
                    log::debug!("deserialize via {} failed: {err}", converter.media_type());
                    reasons.push(err.to_string());
                }
            }
        }
        if reasons.is_empty() {
            reasons.push("no converter matched the offered media types".to_string());
        }
        Err(ConvertError::Exhausted {
            reasons: reasons.join("; "),
        })
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        ConverterRegistry::standard()
    }
}

impl std::fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("media_types", &self.media_types())
            .finish()
    }
}

/// Lossless block JSON.
pub struct JsonConverter;

impl Converter for JsonConverter {
    fn media_type(&self) -> &str {
        "application/json"
    }

    fn serialize(&self, _snapshot: &Snapshot, blocks: &[Block]) -> Result<String, ConvertError> {
        serde_json::to_string(blocks).map_err(|e| ConvertError::Parse {
            media_type: self.media_type().to_string(),
            reason: e.to_string(),
        })
    }

    fn deserialize(&self, data: &str) -> Result<Vec<Block>, ConvertError> {
        serde_json::from_str(data).map_err(|e| ConvertError::Parse {
            media_type: self.media_type().to_string(),
            reason: e.to_string(),
        })
    }
}

/// Plain text: one paragraph per non-empty line, all formatting dropped.
pub struct TextConverter;

impl Converter for TextConverter {
    fn media_type(&self) -> &str {
        "text/plain"
    }

    fn serialize(&self, _snapshot: &Snapshot, blocks: &[Block]) -> Result<String, ConvertError> {
        let lines: Vec<String> = blocks
            .iter()
            .filter_map(|b| b.as_text().map(TextBlock::text))
            .collect();
        Ok(lines.join("\n"))
    }

    fn deserialize(&self, data: &str) -> Result<Vec<Block>, ConvertError> {
        let blocks: Vec<Block> = data
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| Block::Text(TextBlock::new(l)))
            .collect();
        if blocks.is_empty() {
            return Err(ConvertError::Parse {
                media_type: self.media_type().to_string(),
                reason: "no text content".to_string(),
            });
        }
        Ok(blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn negotiation_prefers_json_over_text() {
        let registry = ConverterRegistry::standard();
        let blocks = vec![Block::Text(TextBlock::new("rich"))];
        let json = serde_json::to_string(&blocks).unwrap();
        let items = vec![
            TransferItem::new("text/plain", "plain"),
            TransferItem::new("application/json", json),
        ];
        let result = registry.deserialize(&items).unwrap();
        assert_eq!(result, blocks);
    }

    #[test]
    fn negotiation_continues_past_a_broken_format() {
        let registry = ConverterRegistry::standard();
        let items = vec![
            TransferItem::new("application/json", "{not json"),
            TransferItem::new("text/plain", "fallback line"),
        ];
        let result = registry.deserialize(&items).unwrap();
        assert_eq!(result[0].as_text().unwrap().text(), "fallback line");
    }

    #[test]
    fn exhausted_negotiation_reports_every_reason() {
        let registry = ConverterRegistry::standard();
        let items = vec![
            TransferItem::new("application/json", "[]"),
            TransferItem::new("text/plain", "   "),
        ];
        let err = registry.deserialize(&items).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("produced no blocks"), "{message}");
        assert!(message.contains("no text content"), "{message}");
    }

    #[test]
    fn text_converter_splits_lines_into_paragraphs() {
        let blocks = TextConverter.deserialize("one\n\ntwo\n").unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].as_text().unwrap().text(), "one");
        assert_eq!(blocks[1].as_text().unwrap().text(), "two");
    }
}
