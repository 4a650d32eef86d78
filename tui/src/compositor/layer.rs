//! Layer - A single compositable layer

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;

use super::LayerId;

/// A single layer in the compositor
pub struct Layer {
    pub id: LayerId,
    /// Z-order (higher = in front)
    pub z_index: i32,
    /// Screen position and size
    pub bounds: Rect,
    pub visible: bool,
    /// Render buffer in layer-local coordinates
    pub buffer: Buffer,
    /// Opaque layers copy blank cells too, covering whatever is below
    pub opaque: bool,
}

impl Layer {
    pub fn new(id: LayerId, bounds: Rect, z_index: i32) -> Self {
        Self {
            id,
            z_index,
            bounds,
            visible: true,
            buffer: Buffer::empty(Rect::new(0, 0, bounds.width, bounds.height)),
            opaque: false,
        }
    }
}
