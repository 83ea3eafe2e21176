use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::DocumentError;

/// Block identifier. Non-negative by construction.
pub type BlockId = u32;

/// Ordered mapping of block id to block.
///
/// Serializes as a JSON object keyed by the decimal id: `{"0": {...}}`.
pub type Document = BTreeMap<BlockId, TextBlock>;

/// Placement used for the single block created from the target file.
pub const FILE_BLOCK_X: f64 = -350.0;
pub const FILE_BLOCK_Y: f64 = 30.0;
pub const FILE_BLOCK_WIDTH: f64 = 700.0;

/// One rectangular text region on the canvas.
///
/// `x`/`y` are canvas-relative and may be negative. A `height` of `0` means
/// the client sizes the block to its content; it is optional on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    #[serde(default)]
    pub height: f64,
}

impl TextBlock {
    pub fn new(text: impl Into<String>, x: f64, y: f64, width: f64) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            width,
            height: 0.0,
        }
    }

    #[cfg(test)]
    pub fn with_height(mut self, height: f64) -> Self {
        self.height = height;
        self
    }

    /// The block a freshly loaded target file becomes.
    pub fn from_file_contents(text: impl Into<String>) -> Self {
        Self::new(text, FILE_BLOCK_X, FILE_BLOCK_Y, FILE_BLOCK_WIDTH)
    }

    /// Check geometry invariants: finite coordinates, non-negative size.
    pub fn validate(&self) -> Result<(), DocumentError> {
        let fields = [
            ("x", self.x),
            ("y", self.y),
            ("width", self.width),
            ("height", self.height),
        ];
        if let Some((name, _)) = fields.iter().find(|(_, v)| !v.is_finite()) {
            return Err(DocumentError::Validation(format!("`{name}` must be finite")));
        }
        if self.width < 0.0 {
            return Err(DocumentError::Validation(format!(
                "`width` must be non-negative, got {}",
                self.width
            )));
        }
        if self.height < 0.0 {
            return Err(DocumentError::Validation(format!(
                "`height` must be non-negative, got {}",
                self.height
            )));
        }
        Ok(())
    }
}
