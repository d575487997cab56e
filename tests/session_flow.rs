//! Drives an editing session the way a host UI would: pointer events in
//! display space, frame ticks, processing, undo and reset.

use image::{Rgba, RgbaImage};
use redactfe::{
    ClientRect, EditingSession, EditorConfig, InputEvent, PointerPhase, ProcessOutcome,
    ProcessingMode, SelectionRegion, UndoOutcome,
};

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

fn photo(w: u32, h: u32) -> RgbaImage {
    RgbaImage::from_fn(w, h, |x, y| Rgba([(x * 7 % 256) as u8, (y * 5 % 256) as u8, 128, 255]))
}

fn drag(
    session: &mut EditingSession,
    rect: ClientRect,
    from: (f32, f32),
    via: &[(f32, f32)],
    to: (f32, f32),
) -> Option<ProcessOutcome> {
    session.handle_pointer(&InputEvent::mouse(PointerPhase::Start, from.0, from.1), rect).unwrap();
    for &(x, y) in via {
        session.handle_pointer(&InputEvent::mouse(PointerPhase::Move, x, y), rect).unwrap();
    }
    session.advance_frame();
    session
        .handle_pointer(&InputEvent::mouse(PointerPhase::End, to.0, to.1), rect)
        .unwrap()
}

#[test]
fn full_edit_cycle_returns_to_loaded_pixels() {
    let original = photo(200, 100);
    let mut session = EditingSession::new(EditorConfig::default());
    session.load_image("receipt.png", original.clone()).unwrap();
    let screen = ClientRect::new(0.0, 0.0, 400.0, 200.0);

    for mode in ProcessingMode::ALL {
        session.set_mode(mode);
        let outcome = drag(&mut session, screen, (20.0, 20.0), &[(100.0, 80.0)], (200.0, 160.0));
        assert!(matches!(outcome, Some(ProcessOutcome::Applied { .. })), "{mode}");
    }
    assert_eq!(session.history().len(), 4);
    assert_ne!(session.live_image().unwrap().as_raw(), original.as_raw());

    while session.undo().unwrap() == UndoOutcome::Restored {}
    assert_eq!(session.live_image().unwrap().as_raw(), original.as_raw());

    session.apply(ProcessingMode::FillBlack, &SelectionRegion::from_corners(0.0, 0.0, 50.0, 50.0)).unwrap();
    session.reset();
    assert_eq!(session.live_image().unwrap().as_raw(), original.as_raw());
}

#[test]
fn screen_scale_maps_to_buffer_pixels() {
    let mut session = EditingSession::new(EditorConfig::default());
    session.load_image("white.png", RgbaImage::from_pixel(100, 100, WHITE)).unwrap();
    // Displayed at 4x, starting at (50, 50) on screen.
    let screen = ClientRect::new(50.0, 50.0, 400.0, 400.0);
    let outcome = drag(&mut session, screen, (90.0, 90.0), &[], (130.0, 210.0));
    assert_eq!(
        outcome,
        Some(ProcessOutcome::Applied {
            mode: ProcessingMode::FillBlack,
            rect: redactfe::PixelRect::new(10, 10, 10, 30),
        })
    );
    let img = session.live_image().unwrap();
    assert_eq!(img.get_pixel(10, 10), &BLACK);
    assert_eq!(img.get_pixel(19, 39), &BLACK);
    assert_eq!(img.get_pixel(20, 39), &WHITE);
}

#[test]
fn metrics_are_refreshed_per_drag() {
    let mut session = EditingSession::new(EditorConfig::default());
    session.load_image("white.png", RgbaImage::from_pixel(100, 100, WHITE)).unwrap();

    drag(&mut session, ClientRect::new(0.0, 0.0, 100.0, 100.0), (0.0, 0.0), &[], (10.0, 10.0));
    assert_eq!(session.metrics().unwrap().scale_x, 1.0);

    // Element resized between drags.
    drag(&mut session, ClientRect::new(0.0, 0.0, 50.0, 50.0), (0.0, 0.0), &[], (10.0, 10.0));
    assert_eq!(session.metrics().unwrap().scale_x, 2.0);
    assert_eq!(session.live_image().unwrap().get_pixel(19, 19), &BLACK);
}

#[test]
fn small_drag_and_tap_leave_no_history() {
    let mut session = EditingSession::new(EditorConfig::default());
    session.load_image("white.png", RgbaImage::from_pixel(64, 64, WHITE)).unwrap();
    let screen = ClientRect::new(0.0, 0.0, 64.0, 64.0);

    assert_eq!(drag(&mut session, screen, (10.0, 10.0), &[], (10.0, 10.0)), None);
    assert_eq!(drag(&mut session, screen, (10.0, 10.0), &[(12.0, 40.0)], (15.0, 40.0)), None);
    assert!(!session.can_undo());
    assert!(session.buffer().unwrap().is_pristine());
}

#[test]
fn capacity_bounds_undo_depth() {
    let cfg = EditorConfig::default().with_undo_capacity(16);
    let mut session = EditingSession::new(cfg);
    session.load_image("white.png", RgbaImage::from_pixel(32, 32, WHITE)).unwrap();

    for i in 0..17 {
        let x = (i % 8) as f32 * 4.0;
        session
            .apply(ProcessingMode::FillBlack, &SelectionRegion::from_corners(x, 0.0, x + 4.0, 4.0))
            .unwrap();
    }
    let mut undone = 0;
    while session.undo().unwrap() == UndoOutcome::Restored {
        undone += 1;
    }
    assert_eq!(undone, 16);
    // The first edit can no longer be undone.
    assert_eq!(session.live_image().unwrap().get_pixel(0, 0), &BLACK);
}
