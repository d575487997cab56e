// ============================================================================
// SELECTION TRACKER — drag gesture to validated rectangle
// ============================================================================
//
// Pointer moves are throttled to one applied update per display frame.  A
// move that arrives while an update is still scheduled cancels it and
// schedules its own, so the latest position always wins.  `end` cancels any
// scheduled update before committing; a frame firing after the drag has
// finished can never overwrite the committed rectangle.

use crate::canvas::PixelRect;
use crate::input::BufferPoint;

// ============================================================================
// FRAME SCHEDULING
// ============================================================================

/// Opaque ticket for one scheduled frame callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// "Run at next frame" primitive supplied by the host (animation frame,
/// timer, task queue…).  The host calls [`SelectionTracker::run_frame`] with
/// the handle when the frame fires.
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameHandle;
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Scheduler driven by explicit `advance()` calls.  Used headless and in
/// tests; a windowed host would call `advance` from its frame callback.
#[derive(Debug, Default)]
pub struct ManualFrameClock {
    next_id: u64,
    scheduled: Vec<FrameHandle>,
    cancelled: u64,
}

impl ManualFrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the next frame: returns every handle that was still scheduled.
    pub fn advance(&mut self) -> Vec<FrameHandle> {
        std::mem::take(&mut self.scheduled)
    }

    pub fn scheduled(&self) -> usize {
        self.scheduled.len()
    }

    /// Total number of cancellations seen.
    pub fn cancelled(&self) -> u64 {
        self.cancelled
    }
}

impl FrameScheduler for ManualFrameClock {
    fn request_frame(&mut self) -> FrameHandle {
        self.next_id += 1;
        let handle = FrameHandle(self.next_id);
        self.scheduled.push(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        let before = self.scheduled.len();
        self.scheduled.retain(|h| *h != handle);
        if self.scheduled.len() != before {
            self.cancelled += 1;
        }
    }
}

// ============================================================================
// SELECTION REGION
// ============================================================================

/// Drag rectangle in buffer space.  Start/end keep the drag direction;
/// use [`normalized`](Self::normalized) before reading it as a rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct SelectionRegion {
    pub start_x: f32,
    pub start_y: f32,
    pub end_x: f32,
    pub end_y: f32,
    pub active: bool,
}

impl SelectionRegion {
    /// Zero-size active region anchored at `pos`.
    pub fn at(pos: BufferPoint) -> Self {
        Self {
            start_x: pos.x,
            start_y: pos.y,
            end_x: pos.x,
            end_y: pos.y,
            active: true,
        }
    }

    /// Region between two corners, in any order.
    pub fn from_corners(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            start_x: x0,
            start_y: y0,
            end_x: x1,
            end_y: y1,
            active: true,
        }
    }

    pub fn width(&self) -> f32 {
        (self.end_x - self.start_x).abs()
    }

    pub fn height(&self) -> f32 {
        (self.end_y - self.start_y).abs()
    }

    /// `(x0, y0, w, h)` with the origin at the top-left corner.
    pub fn extent(&self) -> (f32, f32, f32, f32) {
        (
            self.start_x.min(self.end_x),
            self.start_y.min(self.end_y),
            self.width(),
            self.height(),
        )
    }

    /// Same rectangle with start at the top-left and end at the bottom-right.
    pub fn normalized(&self) -> Self {
        let (x0, y0, w, h) = self.extent();
        Self {
            start_x: x0,
            start_y: y0,
            end_x: x0 + w,
            end_y: y0 + h,
            active: self.active,
        }
    }

    /// True when both sides are strictly longer than `threshold`.
    pub fn exceeds(&self, threshold: f32) -> bool {
        self.width() > threshold && self.height() > threshold
    }

    /// Clamp into a `width` × `height` buffer as whole pixels.
    pub fn to_pixel_rect(&self, width: u32, height: u32) -> PixelRect {
        let (x0, y0, w, h) = self.extent();
        if w == 0.0 || h == 0.0 {
            return PixelRect::new(0, 0, 0, 0);
        }
        PixelRect::from_extent(x0, y0, w, h, width, height)
    }
}

// ============================================================================
// TRACKER
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionState {
    Idle,
    Dragging,
    Committed,
}

/// What a tracker call produced, for the caller to act on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SelectionSignal {
    /// A throttled move was applied; redraw the outline.
    Updated(SelectionRegion),
    /// The drag finished with a usable, normalized rectangle.
    Committed(SelectionRegion),
    /// The drag finished too small and was dropped.
    Discarded,
    /// The call had no effect in the current state.
    Ignored,
}

struct PendingMove {
    handle: FrameHandle,
    pos: BufferPoint,
}

pub struct SelectionTracker<S: FrameScheduler> {
    state: SelectionState,
    region: SelectionRegion,
    pending: Option<PendingMove>,
    threshold: f32,
    scheduler: S,
}

impl<S: FrameScheduler> SelectionTracker<S> {
    pub fn new(scheduler: S, threshold: f32) -> Self {
        Self {
            state: SelectionState::Idle,
            region: SelectionRegion::default(),
            pending: None,
            threshold,
            scheduler,
        }
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    pub fn region(&self) -> &SelectionRegion {
        &self.region
    }

    pub fn has_pending_update(&self) -> bool {
        self.pending.is_some()
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// Begin a drag at `pos`.  A drag already in progress is abandoned.
    pub fn start(&mut self, pos: BufferPoint) {
        self.cancel_pending();
        self.region = SelectionRegion::at(pos);
        self.state = SelectionState::Dragging;
    }

    /// Queue an endpoint update for the next frame.  Returns `false` when no
    /// drag is in progress.
    pub fn move_to(&mut self, pos: BufferPoint) -> bool {
        if self.state != SelectionState::Dragging {
            return false;
        }
        self.cancel_pending();
        let handle = self.scheduler.request_frame();
        self.pending = Some(PendingMove { handle, pos });
        true
    }

    /// Frame callback.  Applies the scheduled move if `handle` is the one
    /// currently pending; stale handles are ignored.
    pub fn run_frame(&mut self, handle: FrameHandle) -> Option<SelectionSignal> {
        match self.pending.take() {
            Some(p) if p.handle == handle && self.state == SelectionState::Dragging => {
                self.region.end_x = p.pos.x;
                self.region.end_y = p.pos.y;
                Some(SelectionSignal::Updated(self.region))
            }
            other => {
                self.pending = other;
                None
            }
        }
    }

    /// Finish the drag.  `pos` is the release position when the device
    /// reports one; otherwise the latest scheduled move is used.
    pub fn end(&mut self, pos: Option<BufferPoint>) -> SelectionSignal {
        if self.state != SelectionState::Dragging {
            return SelectionSignal::Ignored;
        }

        let latest = self.pending.as_ref().map(|p| p.pos);
        self.cancel_pending();
        if let Some(p) = pos.or(latest) {
            self.region.end_x = p.x;
            self.region.end_y = p.y;
        }

        if self.region.exceeds(self.threshold) {
            let committed = self.region.normalized();
            self.region.active = false;
            self.state = SelectionState::Committed;
            SelectionSignal::Committed(committed)
        } else {
            self.region = SelectionRegion::default();
            self.state = SelectionState::Idle;
            SelectionSignal::Discarded
        }
    }

    /// Drop any selection and pending update.
    pub fn reset(&mut self) {
        self.cancel_pending();
        self.region = SelectionRegion::default();
        self.state = SelectionState::Idle;
    }

    fn cancel_pending(&mut self) {
        if let Some(p) = self.pending.take() {
            self.scheduler.cancel_frame(p.handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> SelectionTracker<ManualFrameClock> {
        SelectionTracker::new(ManualFrameClock::new(), 5.0)
    }

    fn pt(x: f32, y: f32) -> BufferPoint {
        BufferPoint::new(x, y)
    }

    fn tick(t: &mut SelectionTracker<ManualFrameClock>) -> Vec<SelectionSignal> {
        let due = t.scheduler_mut().advance();
        due.into_iter().filter_map(|h| t.run_frame(h)).collect()
    }

    #[test]
    fn start_anchors_zero_size_region() {
        let mut t = tracker();
        t.start(pt(10.0, 20.0));
        assert_eq!(t.state(), SelectionState::Dragging);
        assert_eq!(*t.region(), SelectionRegion::from_corners(10.0, 20.0, 10.0, 20.0));
    }

    #[test]
    fn move_is_applied_on_next_frame() {
        let mut t = tracker();
        t.start(pt(0.0, 0.0));
        assert!(t.move_to(pt(30.0, 40.0)));
        assert_eq!(t.region().end_x, 0.0);
        let signals = tick(&mut t);
        assert_eq!(signals.len(), 1);
        assert_eq!(t.region().end_x, 30.0);
        assert_eq!(t.region().end_y, 40.0);
    }

    #[test]
    fn newer_move_replaces_scheduled_one() {
        let mut t = tracker();
        t.start(pt(0.0, 0.0));
        t.move_to(pt(10.0, 10.0));
        t.move_to(pt(20.0, 20.0));
        t.move_to(pt(30.0, 25.0));
        assert_eq!(t.scheduler().scheduled(), 1);
        assert_eq!(t.scheduler().cancelled(), 2);
        let signals = tick(&mut t);
        assert_eq!(signals.len(), 1);
        assert_eq!((t.region().end_x, t.region().end_y), (30.0, 25.0));
    }

    #[test]
    fn move_without_drag_is_ignored() {
        let mut t = tracker();
        assert!(!t.move_to(pt(5.0, 5.0)));
        assert_eq!(t.scheduler().scheduled(), 0);
    }

    #[test]
    fn end_commits_normalized_region_and_cancels_frame() {
        let mut t = tracker();
        t.start(pt(50.0, 60.0));
        t.move_to(pt(20.0, 10.0));
        let signal = t.end(Some(pt(10.0, 5.0)));
        assert_eq!(
            signal,
            SelectionSignal::Committed(SelectionRegion::from_corners(10.0, 5.0, 50.0, 60.0))
        );
        assert_eq!(t.state(), SelectionState::Committed);
        assert!(!t.region().active);
        assert_eq!(t.scheduler().scheduled(), 0);
        // A frame that was already in flight must not move the endpoint.
        assert!(tick(&mut t).is_empty());
        assert_eq!((t.region().end_x, t.region().end_y), (10.0, 5.0));
    }

    #[test]
    fn end_without_position_uses_latest_move() {
        let mut t = tracker();
        t.start(pt(0.0, 0.0));
        t.move_to(pt(12.0, 9.0));
        t.move_to(pt(40.0, 30.0));
        let signal = t.end(None);
        assert_eq!(
            signal,
            SelectionSignal::Committed(SelectionRegion::from_corners(0.0, 0.0, 40.0, 30.0))
        );
    }

    #[test]
    fn stale_handle_after_end_is_ignored() {
        let mut t = tracker();
        t.start(pt(0.0, 0.0));
        t.move_to(pt(8.0, 8.0));
        let stale = FrameHandle(1);
        t.end(Some(pt(20.0, 20.0)));
        assert_eq!(t.run_frame(stale), None);
        assert_eq!(t.region().end_x, 20.0);
    }

    #[test]
    fn small_drags_are_discarded() {
        let cases = [(5.0, 50.0), (50.0, 5.0), (0.0, 0.0), (-3.0, 40.0)];
        for (dx, dy) in cases {
            let mut t = tracker();
            t.start(pt(100.0, 100.0));
            let signal = t.end(Some(pt(100.0 + dx, 100.0 + dy)));
            assert_eq!(signal, SelectionSignal::Discarded, "drag {dx}x{dy}");
            assert_eq!(t.state(), SelectionState::Idle);
            assert_eq!(*t.region(), SelectionRegion::default());
        }
    }

    #[test]
    fn zero_threshold_accepts_any_nonzero_drag() {
        let mut t = SelectionTracker::new(ManualFrameClock::new(), 0.0);
        t.start(pt(1.0, 1.0));
        assert!(matches!(t.end(Some(pt(1.5, 2.0))), SelectionSignal::Committed(_)));
        t.start(pt(1.0, 1.0));
        assert_eq!(t.end(Some(pt(1.0, 2.0))), SelectionSignal::Discarded);
    }

    #[test]
    fn end_without_drag_is_ignored() {
        let mut t = tracker();
        assert_eq!(t.end(Some(pt(9.0, 9.0))), SelectionSignal::Ignored);
    }

    #[test]
    fn reset_returns_to_idle_and_cancels() {
        let mut t = tracker();
        t.start(pt(3.0, 3.0));
        t.move_to(pt(30.0, 30.0));
        t.reset();
        assert_eq!(t.state(), SelectionState::Idle);
        assert!(!t.has_pending_update());
        assert_eq!(t.scheduler().scheduled(), 0);
        assert_eq!(*t.region(), SelectionRegion::default());
    }

    #[test]
    fn region_converts_to_clamped_pixels() {
        let r = SelectionRegion::from_corners(8.0, 8.0, -2.0, 2.0);
        assert_eq!(r.to_pixel_rect(6, 6), PixelRect::new(0, 2, 6, 4));
        let flat = SelectionRegion::from_corners(3.5, 1.0, 3.5, 9.0);
        assert!(flat.to_pixel_rect(10, 10).is_empty());
    }
}
