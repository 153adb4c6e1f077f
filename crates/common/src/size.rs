//! Product size axis.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The size of a product variant.
///
/// A product carries at most one inventory record per size; the
/// (product, size) pair is the unit of stock contention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Size {
    S,
    M,
    L,
    XL,
}

/// Error returned when parsing an unknown size string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown size: {0}")]
pub struct ParseSizeError(pub String);

impl Size {
    /// All sizes, in ascending order.
    pub const ALL: [Size; 4] = [Size::S, Size::M, Size::L, Size::XL];

    /// Returns the size name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Size::S => "S",
            Size::M => "M",
            Size::L => "L",
            Size::XL => "XL",
        }
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Size {
    type Err = ParseSizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "S" => Ok(Size::S),
            "M" => Ok(Size::M),
            "L" => Ok(Size::L),
            "XL" => Ok(Size::XL),
            other => Err(ParseSizeError(other.to_string())),
        }
    }
}
