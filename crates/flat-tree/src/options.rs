//! Configuration options for flattened tree views.
//!
//! `TreeOptions` controls how rows are composed from registry records and
//! `WindowOptions` configures the headless [`ListWindow`](crate::ListWindow)
//! surface.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TreeError};

/// Glyphs used by the default row renderer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowMarkers {
    /// Marker for an opened node with children
    pub open: String,
    /// Marker for a closed node with children
    pub closed: String,
    /// Marker for a leaf
    pub leaf: String,
}

impl Default for RowMarkers {
    fn default() -> Self {
        Self {
            open: "▾".to_string(),
            closed: "▸".to_string(),
            leaf: "·".to_string(),
        }
    }
}

/// Configuration options for a tree view.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeOptions {
    /// Indentation per nesting level, in surface units (columns for text).
    pub nesting_multiplier: f32,

    /// Size of a row whose descriptor carries no size override.
    pub row_size: f32,

    /// Glyphs for the default row renderer.
    pub markers: RowMarkers,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            nesting_multiplier: 2.0,
            row_size: 24.0,
            markers: RowMarkers::default(),
        }
    }
}

impl TreeOptions {
    /// Create new tree options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the indentation per nesting level.
    pub fn nesting_multiplier(mut self, multiplier: f32) -> Self {
        self.nesting_multiplier = multiplier;
        self
    }

    /// Set the default row size.
    pub fn row_size(mut self, size: f32) -> Self {
        self.row_size = size;
        self
    }

    /// Set the default renderer's glyphs.
    pub fn markers(mut self, markers: RowMarkers) -> Self {
        self.markers = markers;
        self
    }

    /// Check that the options describe a usable view.
    pub fn validate(&self) -> Result<()> {
        if !self.nesting_multiplier.is_finite() || self.nesting_multiplier < 0.0 {
            return Err(TreeError::invalid(format!(
                "nesting_multiplier must be finite and non-negative, got {}",
                self.nesting_multiplier
            )));
        }
        if !self.row_size.is_finite() || self.row_size <= 0.0 {
            return Err(TreeError::invalid(format!(
                "row_size must be finite and positive, got {}",
                self.row_size
            )));
        }
        Ok(())
    }
}

/// Configuration options for the headless list window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowOptions {
    /// Height of the visible viewport, in surface units.
    pub viewport_size: f32,

    /// Extra rows materialised on each side of the visible range.
    pub overscan_count: usize,

    /// Scroll offset the window starts at.
    pub initial_offset: f32,
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self {
            viewport_size: 240.0,
            overscan_count: 2,
            initial_offset: 0.0,
        }
    }
}

impl WindowOptions {
    /// Create new window options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the viewport size.
    pub fn viewport_size(mut self, size: f32) -> Self {
        self.viewport_size = size;
        self
    }

    /// Set the overscan row count.
    pub fn overscan_count(mut self, count: usize) -> Self {
        self.overscan_count = count;
        self
    }

    /// Set the initial scroll offset.
    pub fn initial_offset(mut self, offset: f32) -> Self {
        self.initial_offset = offset;
        self
    }

    /// Check that the options describe a usable window.
    pub fn validate(&self) -> Result<()> {
        if !self.viewport_size.is_finite() || self.viewport_size < 0.0 {
            return Err(TreeError::invalid(format!(
                "viewport_size must be finite and non-negative, got {}",
                self.viewport_size
            )));
        }
        if !self.initial_offset.is_finite() || self.initial_offset < 0.0 {
            return Err(TreeError::invalid(format!(
                "initial_offset must be finite and non-negative, got {}",
                self.initial_offset
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(TreeOptions::default().validate().is_ok());
        assert!(WindowOptions::default().validate().is_ok());
        assert_eq!(TreeOptions::new().nesting_multiplier, 2.0);
        assert_eq!(WindowOptions::new().overscan_count, 2);
    }

    #[test]
    fn test_rejects_bad_tree_options() {
        let err = TreeOptions::new().row_size(0.0).validate().unwrap_err();
        assert!(matches!(err, TreeError::InvalidOptions { .. }));

        assert!(TreeOptions::new()
            .nesting_multiplier(-1.0)
            .validate()
            .is_err());
        assert!(TreeOptions::new()
            .nesting_multiplier(f32::NAN)
            .validate()
            .is_err());
        assert!(TreeOptions::new().nesting_multiplier(0.0).validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_window_options() {
        assert!(WindowOptions::new().viewport_size(-5.0).validate().is_err());
        assert!(WindowOptions::new()
            .initial_offset(f32::INFINITY)
            .validate()
            .is_err());
        assert!(WindowOptions::new().viewport_size(0.0).validate().is_ok());
    }
}
