//! Vector dimension.

use std::fmt;

/// Dimension of a vector quantity. Always at least 1.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct Dimension(u32);

impl Dimension {
    /// Create a dimension, rejecting 0.
    #[inline]
    pub const fn new(raw: u32) -> Option<Self> {
        if raw == 0 {
            None
        } else {
            Some(Dimension(raw))
        }
    }

    /// The raw dimension value.
    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Dimension implied by a type name's trailing digits, if any.
    ///
    /// "Position3" implies 3, "Displacement2" implies 2, "Speed" implies
    /// nothing. Only the simple name (after the last path separator) is
    /// considered.
    pub fn implied_by_name(path: &str) -> Option<Self> {
        let simple = path.rsplit("::").next().unwrap_or(path);
        let digits_start = simple
            .char_indices()
            .rev()
            .take_while(|(_, c)| c.is_ascii_digit())
            .last()
            .map(|(i, _)| i)?;
        let digits = &simple[digits_start..];
        // A purely numeric name implies nothing.
        if digits_start == 0 {
            return None;
        }
        digits.parse::<u32>().ok().and_then(Dimension::new)
    }
}

impl fmt::Debug for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dimension({})", self.0)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
