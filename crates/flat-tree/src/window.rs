//! Headless list window
//!
//! A reference [`RenderSurface`] that keeps prefix sums over row sizes for
//! offset → index lookup, and computes the visible range plus overscan for a
//! scroll offset. It draws nothing; a UI layer reads the range and styles.

use log::trace;

use crate::error::Result;
use crate::options::WindowOptions;
use crate::render::{RenderSurface, RenderedRange, RowStyle, ScrollAlign};

/// Windowed layout over a list of variable-size rows
#[derive(Clone, Debug)]
pub struct ListWindow {
    options: WindowOptions,
    /// `offsets[i]` is where row `i` starts; the last entry is the total size
    offsets: Vec<f32>,
    scroll_offset: f32,
}

impl ListWindow {
    /// Create an empty window.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::InvalidOptions`](crate::TreeError::InvalidOptions)
    /// if `options` do not validate.
    pub fn new(options: WindowOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            scroll_offset: options.initial_offset,
            options,
            offsets: vec![0.0],
        })
    }

    /// Number of rows laid out
    pub fn row_count(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Sum of all row sizes
    pub fn total_size(&self) -> f32 {
        self.offsets.last().copied().unwrap_or(0.0)
    }

    /// Current scroll offset
    pub fn scroll_offset(&self) -> f32 {
        self.scroll_offset
    }

    /// Current viewport size
    pub fn viewport_size(&self) -> f32 {
        self.options.viewport_size
    }

    /// Resize the viewport, keeping the scroll offset in bounds
    pub fn set_viewport_size(&mut self, size: f32) {
        self.options.viewport_size = size.max(0.0);
        self.scroll_offset = self.clamp(self.scroll_offset);
    }

    fn max_scroll(&self) -> f32 {
        (self.total_size() - self.options.viewport_size).max(0.0)
    }

    fn clamp(&self, offset: f32) -> f32 {
        offset.clamp(0.0, self.max_scroll())
    }

    /// Index of the row covering `offset`, for a non-empty list
    fn index_at(&self, offset: f32) -> usize {
        let rows = self.row_count();
        self.offsets[..rows]
            .partition_point(|&start| start <= offset)
            .saturating_sub(1)
            .min(rows.saturating_sub(1))
    }
}

impl RenderSurface for ListWindow {
    fn set_rows(&mut self, sizes: &[f32]) {
        let mut offsets = Vec::with_capacity(sizes.len() + 1);
        let mut total = 0.0;
        offsets.push(total);
        for size in sizes {
            total += size.max(0.0);
            offsets.push(total);
        }
        self.offsets = offsets;
        // Keep the initial offset until there is something to scroll
        if !sizes.is_empty() {
            self.scroll_offset = self.clamp(self.scroll_offset);
        }
        trace!(
            "ListWindow laid out {} rows, total size {}",
            sizes.len(),
            total
        );
    }

    fn rendered_range(&self) -> RenderedRange {
        let rows = self.row_count();
        if rows == 0 {
            return RenderedRange::default();
        }

        let start = self.index_at(self.scroll_offset);
        let bottom = self.scroll_offset + self.options.viewport_size;
        let end = self.offsets[..rows]
            .partition_point(|&row_start| row_start < bottom)
            .max(start + 1)
            .min(rows);

        let overscan = self.options.overscan_count;
        RenderedRange {
            overscan_start: start.saturating_sub(overscan),
            overscan_end: (end + overscan).min(rows),
            visible_start: start,
            visible_end: end,
        }
    }

    fn row_style(&self, index: usize) -> RowStyle {
        match (self.offsets.get(index), self.offsets.get(index + 1)) {
            (Some(&start), Some(&end)) => RowStyle {
                offset: start,
                size: end - start,
            },
            _ => RowStyle {
                offset: self.total_size(),
                size: 0.0,
            },
        }
    }

    fn scroll_to(&mut self, offset: f32) {
        self.scroll_offset = self.clamp(offset);
    }

    fn scroll_to_index(&mut self, index: usize, align: ScrollAlign) {
        self.scroll_offset = self.offset_for_index(index, align);
    }

    fn offset_for_index(&self, index: usize, align: ScrollAlign) -> f32 {
        let rows = self.row_count();
        if rows == 0 {
            return 0.0;
        }

        let style = self.row_style(index.min(rows - 1));
        let viewport = self.options.viewport_size;
        // Row aligned with the start / the end of the viewport
        let max_offset = self.clamp(style.offset);
        let min_offset = self.clamp(style.offset - viewport + style.size);
        let current = self.scroll_offset;

        let auto = || {
            if current >= min_offset && current <= max_offset {
                current
            } else if current < min_offset {
                min_offset
            } else {
                max_offset
            }
        };
        let center = || self.clamp(style.offset - (viewport - style.size) / 2.0);

        match align {
            ScrollAlign::Start => max_offset,
            ScrollAlign::End => min_offset,
            ScrollAlign::Center => center(),
            ScrollAlign::Auto => auto(),
            ScrollAlign::Smart => {
                if current >= min_offset - viewport && current <= max_offset + viewport {
                    auto()
                } else {
                    center()
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 10 rows of 20, viewport of 60
    fn window(overscan: usize) -> ListWindow {
        let options = WindowOptions::new()
            .viewport_size(60.0)
            .overscan_count(overscan);
        let mut window = ListWindow::new(options).unwrap();
        window.set_rows(&[20.0; 10]);
        window
    }

    #[test]
    fn test_empty_window() {
        let window = ListWindow::new(WindowOptions::default()).unwrap();
        assert_eq!(window.row_count(), 0);
        assert!(window.rendered_range().is_empty());
        assert_eq!(window.offset_for_index(3, ScrollAlign::Start), 0.0);
    }

    #[test]
    fn test_rendered_range_with_overscan() {
        let mut window = window(1);
        assert_eq!(
            window.rendered_range(),
            RenderedRange {
                overscan_start: 0,
                overscan_end: 4,
                visible_start: 0,
                visible_end: 3,
            }
        );

        window.scroll_to(50.0);
        let range = window.rendered_range();
        assert_eq!((range.visible_start, range.visible_end), (2, 6));
        assert_eq!((range.overscan_start, range.overscan_end), (1, 7));
    }

    #[test]
    fn test_scroll_is_clamped() {
        let mut window = window(0);
        window.scroll_to(1_000.0);
        assert_eq!(window.scroll_offset(), 140.0);
        assert_eq!(window.rendered_range().indices(), 7..10);

        window.scroll_to(-3.0);
        assert_eq!(window.scroll_offset(), 0.0);

        window.set_rows(&[20.0; 2]);
        window.scroll_to(30.0);
        assert_eq!(window.scroll_offset(), 0.0);
    }

    #[test]
    fn test_initial_offset_survives_empty_layout() {
        let options = WindowOptions::new()
            .viewport_size(60.0)
            .initial_offset(40.0);
        let mut window = ListWindow::new(options).unwrap();
        window.set_rows(&[]);
        assert_eq!(window.scroll_offset(), 40.0);

        window.set_rows(&[20.0; 10]);
        assert_eq!(window.scroll_offset(), 40.0);
        assert_eq!(window.rendered_range().visible_start, 2);
    }

    #[test]
    fn test_variable_row_styles() {
        let mut window = ListWindow::new(WindowOptions::new().viewport_size(25.0)).unwrap();
        window.set_rows(&[10.0, 30.0, 5.0]);

        assert_eq!(window.total_size(), 45.0);
        assert_eq!(window.row_style(1), RowStyle { offset: 10.0, size: 30.0 });
        assert_eq!(window.row_style(2), RowStyle { offset: 40.0, size: 5.0 });
        assert_eq!(window.row_style(9), RowStyle { offset: 45.0, size: 0.0 });

        window.scroll_to(15.0);
        let range = window.rendered_range();
        assert_eq!((range.visible_start, range.visible_end), (1, 2));
    }

    #[test]
    fn test_offset_for_index_alignments() {
        let mut window = window(0);

        assert_eq!(window.offset_for_index(5, ScrollAlign::Start), 100.0);
        assert_eq!(window.offset_for_index(5, ScrollAlign::End), 60.0);
        assert_eq!(window.offset_for_index(5, ScrollAlign::Center), 80.0);
        // Row 1 is already visible at offset 0
        assert_eq!(window.offset_for_index(1, ScrollAlign::Auto), 0.0);
        assert_eq!(window.offset_for_index(5, ScrollAlign::Auto), 60.0);
        // Last rows cannot be aligned past the end
        assert_eq!(window.offset_for_index(9, ScrollAlign::Start), 140.0);
        assert_eq!(window.offset_for_index(42, ScrollAlign::Start), 140.0);

        window.scroll_to_index(5, ScrollAlign::Start);
        assert_eq!(window.scroll_offset(), 100.0);
        // Row 6 is visible, auto keeps the offset
        assert_eq!(window.offset_for_index(6, ScrollAlign::Auto), 100.0);
    }

    #[test]
    fn test_smart_alignment() {
        let window = window(0);
        // Near the viewport: behaves like auto
        assert_eq!(window.offset_for_index(4, ScrollAlign::Smart), 40.0);
        // Far away: centers
        assert_eq!(window.offset_for_index(8, ScrollAlign::Smart), 140.0);
        assert_eq!(window.offset_for_index(7, ScrollAlign::Smart), 120.0);
    }
}
