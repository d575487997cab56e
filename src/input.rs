// ============================================================================
// POINTER INPUT — display space to buffer space
// ============================================================================
//
// Mouse and touch events are unified at the boundary into one `InputEvent`
// carrying a single client-space position.  `CanvasMetrics` captures how the
// buffer is currently laid out on screen and maps positions into buffer
// pixels.  Metrics are measured when an interaction starts; the displayed
// element can be resized between drags, but not meaningfully during one.

/// Which device produced the event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Touch,
}

/// Where in a drag gesture the event sits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerPhase {
    Start,
    Move,
    End,
}

/// One pointer sample in client (display) coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InputEvent {
    pub kind: PointerKind,
    pub phase: PointerPhase,
    pub client_x: f32,
    pub client_y: f32,
}

impl InputEvent {
    pub fn mouse(phase: PointerPhase, client_x: f32, client_y: f32) -> Self {
        Self {
            kind: PointerKind::Mouse,
            phase,
            client_x,
            client_y,
        }
    }

    /// Build a touch event from the active touch points, falling back to the
    /// points that just changed (a lifted finger is only reported there).
    /// Only the first point is used.
    pub fn touch(phase: PointerPhase, active: &[(f32, f32)], changed: &[(f32, f32)]) -> Option<Self> {
        let &(client_x, client_y) = active.first().or_else(|| changed.first())?;
        Some(Self {
            kind: PointerKind::Touch,
            phase,
            client_x,
            client_y,
        })
    }
}

/// On-screen bounding rectangle of the element displaying the buffer.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct ClientRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl ClientRect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self { left, top, width, height }
    }
}

/// Position in buffer pixels.  May lie outside the buffer when the pointer
/// leaves the displayed element mid-drag.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct BufferPoint {
    pub x: f32,
    pub y: f32,
}

impl BufferPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Clamp into `[0, width] × [0, height]`.
    pub fn clamped(self, width: u32, height: u32) -> Self {
        Self {
            x: self.x.clamp(0.0, width as f32),
            y: self.y.clamp(0.0, height as f32),
        }
    }
}

/// Display geometry of the buffer, derived from its on-screen rectangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CanvasMetrics {
    pub rect: ClientRect,
    pub display_width: f32,
    pub display_height: f32,
    pub scale_x: f32,
    pub scale_y: f32,
}

impl CanvasMetrics {
    /// Measure the current layout.  Returns `None` while the element has no
    /// on-screen area (hidden, collapsed, not yet laid out).
    pub fn measure(rect: ClientRect, buffer_width: u32, buffer_height: u32) -> Option<Self> {
        if !(rect.width > 0.0 && rect.height > 0.0) || buffer_width == 0 || buffer_height == 0 {
            return None;
        }
        Some(Self {
            rect,
            display_width: rect.width,
            display_height: rect.height,
            scale_x: buffer_width as f32 / rect.width,
            scale_y: buffer_height as f32 / rect.height,
        })
    }

    /// Map an event's client position into buffer space.  No clamping.
    pub fn to_buffer_coords(&self, event: &InputEvent) -> BufferPoint {
        BufferPoint {
            x: (event.client_x - self.rect.left) * self.scale_x,
            y: (event.client_y - self.rect.top) * self.scale_y,
        }
    }
}
