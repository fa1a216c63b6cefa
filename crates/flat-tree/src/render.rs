//! Render adapter
//!
//! Turns a flat row index into the parameters a row renderer needs, and wires
//! a [`TreeFlattener`] to a windowed [`RenderSurface`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::engine::TreeFlattener;
use crate::error::Result;
use crate::node::ToggleHandle;
use crate::options::{RowMarkers, TreeOptions};
use crate::source::TreeSource;

/// Placement of one row on the rendering surface
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RowStyle {
    /// Distance from the start of the list
    pub offset: f32,
    /// Extent of the row along the scroll axis
    pub size: f32,
}

/// Alignment used when scrolling a row into view
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScrollAlign {
    /// Scroll as little as possible to make the row visible
    #[default]
    Auto,
    /// Like `Auto` when the row is near the viewport, otherwise `Center`
    Smart,
    /// Align the row with the start of the viewport
    Start,
    /// Center the row in the viewport
    Center,
    /// Align the row with the end of the viewport
    End,
}

/// Rows a surface materialises: the visible range plus overscan.
///
/// Both ranges are half-open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedRange {
    pub overscan_start: usize,
    pub overscan_end: usize,
    pub visible_start: usize,
    pub visible_end: usize,
}

impl RenderedRange {
    /// Indices to materialise
    pub fn indices(&self) -> std::ops::Range<usize> {
        self.overscan_start..self.overscan_end
    }

    /// Returns true if nothing is materialised
    pub fn is_empty(&self) -> bool {
        self.overscan_start >= self.overscan_end
    }
}

/// A windowed rendering surface.
///
/// The surface knows the size of every row and the viewport; it decides which
/// rows to materialise and where they go. It never sees tree structure.
pub trait RenderSurface {
    /// Replace the row layout. `sizes[i]` is the size of flat row `i`.
    fn set_rows(&mut self, sizes: &[f32]);

    /// Rows to materialise for the current scroll position
    fn rendered_range(&self) -> RenderedRange;

    /// Placement of a row
    fn row_style(&self, index: usize) -> RowStyle;

    /// Scroll to an absolute offset
    fn scroll_to(&mut self, offset: f32);

    /// Scroll so that a row is visible
    fn scroll_to_index(&mut self, index: usize, align: ScrollAlign);

    /// Offset `scroll_to_index` would scroll to
    fn offset_for_index(&self, index: usize, align: ScrollAlign) -> f32;
}

/// Everything a row renderer receives for one flat row
#[derive(Debug)]
pub struct RowProps<'a, K, P> {
    /// Flat row index
    pub index: usize,
    pub id: &'a K,
    pub nesting_level: usize,
    pub children_count: usize,
    pub payload: &'a P,
    pub is_opened: bool,
    /// Handle that toggles this row's node
    pub toggle: &'a ToggleHandle<K>,
    /// Placement supplied by the surface, or the node's style override
    pub style: RowStyle,
    /// Left indentation, `nesting_level × nesting_multiplier`
    pub indentation: f32,
}

impl<K, P> RowProps<'_, K, P> {
    /// Returns true if the row's node has no children
    pub fn is_leaf(&self) -> bool {
        self.children_count == 0
    }
}

/// Builds the visual element for one row
pub trait RowRenderer<K, P> {
    type Output;

    fn render_row(&self, row: RowProps<'_, K, P>) -> Self::Output;
}

impl<K, P, O, F> RowRenderer<K, P> for F
where
    F: Fn(RowProps<'_, K, P>) -> O,
{
    type Output = O;

    fn render_row(&self, row: RowProps<'_, K, P>) -> O {
        self(row)
    }
}

/// Fallback renderer producing one line of text per row
#[derive(Clone, Debug, Default)]
pub struct DefaultRowRenderer {
    markers: RowMarkers,
}

impl DefaultRowRenderer {
    pub fn new(markers: RowMarkers) -> Self {
        Self { markers }
    }
}

impl<K: fmt::Display, P> RowRenderer<K, P> for DefaultRowRenderer {
    type Output = String;

    fn render_row(&self, row: RowProps<'_, K, P>) -> String {
        let marker = if row.is_leaf() {
            &self.markers.leaf
        } else if row.is_opened {
            &self.markers.open
        } else {
            &self.markers.closed
        };
        let indent = row.indentation.max(0.0).round() as usize;
        format!("{:indent$}{} {}", "", marker, row.id, indent = indent)
    }
}

/// Map a flat row index to its render parameters.
///
/// Returns `None` if `index` is out of range.
pub fn row_props<'a, S: TreeSource>(
    flattener: &'a TreeFlattener<S>,
    index: usize,
    style: RowStyle,
    options: &TreeOptions,
) -> Option<RowProps<'a, S::Id, S::Payload>> {
    let record = flattener.record_at(index)?;
    let descriptor = record.descriptor();
    Some(RowProps {
        index,
        id: record.id(),
        nesting_level: descriptor.nesting_level,
        children_count: descriptor.children_count,
        payload: &descriptor.payload,
        is_opened: record.is_opened(),
        toggle: record.toggle_handle(),
        style: descriptor.style_override.unwrap_or(style),
        indentation: descriptor.nesting_level as f32 * options.nesting_multiplier,
    })
}

type RangeListener = Box<dyn FnMut(RenderedRange)>;

/// A flattened tree bound to a rendering surface and a row renderer
pub struct TreeView<S: TreeSource, W, R> {
    flattener: TreeFlattener<S>,
    surface: W,
    renderer: R,
    options: TreeOptions,
    last_range: Option<RenderedRange>,
    on_items_rendered: Option<RangeListener>,
}

impl<S, W, R> TreeView<S, W, R>
where
    S: TreeSource,
    W: RenderSurface,
    R: RowRenderer<S::Id, S::Payload>,
{
    /// Create a view. Nothing is traversed until the first recomputation.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::InvalidOptions`](crate::TreeError::InvalidOptions)
    /// if `options` do not validate.
    pub fn new(source: S, surface: W, renderer: R, options: TreeOptions) -> Result<Self> {
        options.validate()?;
        let mut view = Self {
            flattener: TreeFlattener::new(source),
            surface,
            renderer,
            options,
            last_range: None,
            on_items_rendered: None,
        };
        view.sync_surface();
        Ok(view)
    }

    /// The underlying flattener
    pub fn flattener(&self) -> &TreeFlattener<S> {
        &self.flattener
    }

    /// Mutable access to the tree source
    pub fn source_mut(&mut self) -> &mut S {
        self.flattener.source_mut()
    }

    /// The rendering surface
    pub fn surface(&self) -> &W {
        &self.surface
    }

    /// The view's options
    pub fn options(&self) -> &TreeOptions {
        &self.options
    }

    /// Visible identities in depth-first order
    pub fn flat_order(&self) -> &[S::Id] {
        self.flattener.flat_order()
    }

    /// Number of rows handed to the surface
    pub fn row_count(&self) -> usize {
        self.flattener.row_count()
    }

    /// See [`TreeFlattener::recompute_tree`]
    pub fn recompute_tree(&mut self, refresh: bool, ignore_inner_state: bool) -> Result<()> {
        self.flattener.recompute_tree(refresh, ignore_inner_state)?;
        self.sync_surface();
        Ok(())
    }

    /// See [`TreeFlattener::toggle_nodes`]
    pub fn toggle_nodes<I>(&mut self, changes: I) -> Result<()>
    where
        I: IntoIterator<Item = (S::Id, bool)>,
    {
        self.flattener.toggle_nodes(changes)?;
        self.sync_surface();
        Ok(())
    }

    /// See [`TreeFlattener::toggle`]
    pub fn toggle(&mut self, handle: &ToggleHandle<S::Id>) -> Result<()> {
        self.flattener.toggle(handle)?;
        self.sync_surface();
        Ok(())
    }

    /// See [`TreeFlattener::open_all`]
    pub fn open_all(&mut self) -> Result<()> {
        self.flattener.open_all()?;
        self.sync_surface();
        Ok(())
    }

    /// See [`TreeFlattener::close_all`]
    pub fn close_all(&mut self) -> Result<()> {
        self.flattener.close_all()?;
        self.sync_surface();
        Ok(())
    }

    /// Render parameters for one row
    pub fn row(&self, index: usize) -> Option<RowProps<'_, S::Id, S::Payload>> {
        let style = self.surface.row_style(index);
        row_props(&self.flattener, index, style, &self.options)
    }

    /// Render one row
    pub fn render_row(&self, index: usize) -> Option<R::Output> {
        self.row(index).map(|row| self.renderer.render_row(row))
    }

    /// Render every row the surface materialises.
    ///
    /// Listeners registered with [`on_items_rendered`](Self::on_items_rendered)
    /// are notified when the materialised range differs from the last pass.
    pub fn render(&mut self) -> Vec<R::Output> {
        let range = self.surface.rendered_range();
        let rows = range
            .indices()
            .filter_map(|index| self.render_row(index))
            .collect();

        if self.last_range != Some(range) {
            self.last_range = Some(range);
            if let Some(listener) = self.on_items_rendered.as_mut() {
                listener(range);
            }
        }
        rows
    }

    /// Register the listener for rendered-range changes, replacing any
    /// previous one. The range is passed on unchanged from the surface.
    pub fn on_items_rendered(&mut self, listener: impl FnMut(RenderedRange) + 'static) {
        self.on_items_rendered = Some(Box::new(listener));
    }

    /// Scroll the surface to an absolute offset
    pub fn scroll_to(&mut self, offset: f32) {
        self.surface.scroll_to(offset);
    }

    /// Scroll the surface so that a row is visible
    pub fn scroll_to_item(&mut self, index: usize, align: ScrollAlign) {
        self.surface.scroll_to_index(index, align);
    }

    /// Offset the surface would scroll to for a row
    pub fn offset_for_index(&self, index: usize, align: ScrollAlign) -> f32 {
        self.surface.offset_for_index(index, align)
    }

    fn sync_surface(&mut self) {
        let row_size = self.options.row_size;
        let sizes: Vec<f32> = (0..self.flattener.row_count())
            .map(|index| {
                self.flattener
                    .record_at(index)
                    .and_then(|record| record.descriptor().size_override)
                    .unwrap_or(row_size)
            })
            .collect();
        self.surface.set_rows(&sizes);
    }
}
