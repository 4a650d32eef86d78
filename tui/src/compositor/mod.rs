//! Layered Compositor
//!
//! Z-ordered layers for the card, its buttons, asides and effects. Each
//! layer owns a buffer in local coordinates; `composite` stacks the visible
//! ones back to front.
//!
//! Transparent layers only copy non-blank cells, so confetti can fall over
//! the card without erasing it. Opaque layers copy everything (the blackout).

mod layer;

use std::collections::HashMap;

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Color;

pub use layer::Layer;

/// Unique identifier for a layer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LayerId(u32);

/// The compositor manages all layers and composites them together
pub struct Compositor {
    layers: HashMap<LayerId, Layer>,
    /// Layers sorted by z-index for rendering
    render_order: Vec<LayerId>,
    next_id: u32,
    /// Composited result
    output: Buffer,
    area: Rect,
}

impl Compositor {
    pub fn new(area: Rect) -> Self {
        Self {
            layers: HashMap::new(),
            render_order: Vec::new(),
            next_id: 0,
            output: Buffer::empty(area),
            area,
        }
    }

    /// Create a new layer and return its ID
    pub fn create_layer(&mut self, bounds: Rect, z_index: i32) -> LayerId {
        let id = LayerId(self.next_id);
        self.next_id += 1;

        let layer = Layer::new(id, bounds, z_index);
        self.layers.insert(id, layer);
        self.update_render_order();

        id
    }

    /// Get mutable access to a layer's buffer for rendering
    pub fn layer_buffer_mut(&mut self, id: LayerId) -> Option<&mut Buffer> {
        self.layers.get_mut(&id).map(|l| &mut l.buffer)
    }

    /// Resize a layer
    pub fn resize_layer(&mut self, id: LayerId, width: u16, height: u16) {
        if let Some(layer) = self.layers.get_mut(&id) {
            layer.bounds.width = width;
            layer.bounds.height = height;
            // Buffer uses origin coordinates
            layer.buffer = Buffer::empty(Rect::new(0, 0, width, height));
        }
    }

    pub fn set_visible(&mut self, id: LayerId, visible: bool) {
        if let Some(layer) = self.layers.get_mut(&id) {
            layer.visible = visible;
        }
    }

    pub fn set_opaque(&mut self, id: LayerId, opaque: bool) {
        if let Some(layer) = self.layers.get_mut(&id) {
            layer.opaque = opaque;
        }
    }

    /// Resize the output and every full-screen layer with it
    pub fn resize(&mut self, area: Rect) {
        self.area = area;
        self.output = Buffer::empty(area);
        let ids: Vec<LayerId> = self.layers.keys().copied().collect();
        for id in ids {
            self.resize_layer(id, area.width, area.height);
        }
    }

    /// Composite all visible layers into the output buffer
    pub fn composite(&mut self) -> &Buffer {
        self.output.reset();

        // Back to front
        for id in &self.render_order {
            if let Some(layer) = self.layers.get(id) {
                if layer.visible {
                    Self::blit_layer(&mut self.output, &self.area, layer);
                }
            }
        }

        &self.output
    }

    fn blit_layer(output: &mut Buffer, area: &Rect, layer: &Layer) {
        let lb = &layer.bounds;

        for ly in 0..lb.height {
            for lx in 0..lb.width {
                let dst_x = lb.x + lx;
                let dst_y = lb.y + ly;

                if dst_x >= area.width || dst_y >= area.height {
                    continue;
                }

                let src_idx = layer.buffer.index_of(lx, ly);
                let Some(src_cell) = layer.buffer.content.get(src_idx) else {
                    continue;
                };

                // Blank cells are holes unless the layer is opaque
                if layer.opaque || src_cell.symbol() != " " {
                    let dst_idx = output.index_of(dst_x, dst_y);
                    if let Some(dst) = output.content.get_mut(dst_idx) {
                        let below = dst.bg;
                        *dst = src_cell.clone();
                        // An unset background shows the cell underneath
                        if !layer.opaque && dst.bg == Color::Reset {
                            dst.bg = below;
                        }
                    }
                }
            }
        }
    }

    fn update_render_order(&mut self) {
        self.render_order = self.layers.keys().copied().collect();
        self.render_order
            .sort_by_key(|id| self.layers.get(id).map(|l| l.z_index).unwrap_or(0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use ratatui::style::Style;

    fn area() -> Rect {
        Rect::new(0, 0, 6, 2)
    }

    #[test]
    fn test_transparent_layer_keeps_cells_below() {
        let mut compositor = Compositor::new(area());
        let back = compositor.create_layer(area(), 0);
        let front = compositor.create_layer(area(), 10);

        if let Some(buf) = compositor.layer_buffer_mut(back) {
            buf.set_string(0, 0, "card", Style::default());
        }
        if let Some(buf) = compositor.layer_buffer_mut(front) {
            buf.set_string(1, 0, "*", Style::default());
        }

        let out = compositor.composite();
        assert_eq!(out[(0, 0)].symbol(), "c");
        assert_eq!(out[(1, 0)].symbol(), "*");
        assert_eq!(out[(2, 0)].symbol(), "r");
    }

    #[test]
    fn test_opaque_layer_covers_everything() {
        let mut compositor = Compositor::new(area());
        let back = compositor.create_layer(area(), 0);
        let cover = compositor.create_layer(area(), 40);
        compositor.set_opaque(cover, true);

        if let Some(buf) = compositor.layer_buffer_mut(back) {
            buf.set_string(0, 0, "card", Style::default());
        }
        if let Some(buf) = compositor.layer_buffer_mut(cover) {
            buf.set_style(area(), Style::default().bg(Color::Black));
        }

        let out = compositor.composite();
        assert_eq!(out[(0, 0)].symbol(), " ");
        assert_eq!(out[(0, 0)].bg, Color::Black);
    }

    #[test]
    fn test_glyph_keeps_background_below() {
        let mut compositor = Compositor::new(area());
        let back = compositor.create_layer(area(), 0);
        let front = compositor.create_layer(area(), 10);
        compositor.set_opaque(back, true);

        if let Some(buf) = compositor.layer_buffer_mut(back) {
            buf.set_style(area(), Style::default().bg(Color::Blue));
        }
        if let Some(buf) = compositor.layer_buffer_mut(front) {
            buf.set_string(2, 1, "•", Style::default().fg(Color::Red));
        }

        let out = compositor.composite();
        assert_eq!(out[(2, 1)].symbol(), "•");
        assert_eq!(out[(2, 1)].fg, Color::Red);
        assert_eq!(out[(2, 1)].bg, Color::Blue);
    }

    #[test]
    fn test_hidden_layer_is_skipped() {
        let mut compositor = Compositor::new(area());
        let layer = compositor.create_layer(area(), 0);
        if let Some(buf) = compositor.layer_buffer_mut(layer) {
            buf.set_string(0, 0, "x", Style::default());
        }
        compositor.set_visible(layer, false);
        assert_eq!(compositor.composite()[(0, 0)].symbol(), " ");
    }
}
