//! Example: Shrink the viewport, drag it around and exit, against the mock host.
//!
//! Run with: `RUST_LOG=debug cargo run --example shrink_session`

use std::time::{Duration, Instant};

use shrinkview_core::{
    ControlTarget, EnvironmentEvent, Horizontal, MockHost, ModeController, Session, SurfaceKind, TouchEvent,
    TouchPhase, ViewportConfig, ViewportError,
};

fn pump(controller: &ModeController) {
    let mut now = Instant::now();
    while controller.step(now) {
        now += Duration::from_millis(16);
    }
}

fn main() -> Result<(), ViewportError> {
    // Initialize logging (optional)
    env_logger::init();

    let host = MockHost::new();
    host.set_feature_enabled(0, true);
    let controller = ModeController::new(ViewportConfig::default(), Session::new(0), host.services())?;

    // Swipe in from the right edge of the navigation bar
    controller.handle_event(EnvironmentEvent::Trigger {
        alignment: Some(Horizontal::Right),
        vertical_position: None,
    });
    pump(&controller);
    controller.wait_surfaces_idle(Duration::from_secs(1));
    println!("Entered: {}", controller.mode());
    println!("Transform: {:?}", controller.current_transform());

    // Drag the handle up by 200 shrunk pixels
    for (phase, y) in [(TouchPhase::Down, 600.0), (TouchPhase::Move, 500.0), (TouchPhase::Move, 400.0), (TouchPhase::Up, 400.0)] {
        controller.dispatch_touch(ControlTarget::DragHandle, TouchEvent::new(phase, 500.0, y));
    }
    controller.wait_surfaces_idle(Duration::from_secs(1));
    println!("After drag: {}", controller.mode());

    // Flip to the other side
    controller.dispatch_touch(ControlTarget::FlipButton, TouchEvent::new(TouchPhase::Up, 0.0, 0.0));
    controller.wait_surfaces_idle(Duration::from_secs(1));
    pump(&controller);
    println!("After flip: {}", controller.mode());
    if let Some(guide) = controller.surface_transform(SurfaceKind::Guide) {
        println!("Guide alpha: {:.2}", guide.alpha);
    }

    // Tap outside to leave
    controller.notify_outside_touch(10.0, 10.0);
    controller.wait_surfaces_idle(Duration::from_secs(1));
    pump(&controller);

    println!("{}", controller.state());
    for event in host.operations() {
        println!("recorded: {}", event.operation);
    }

    Ok(())
}
