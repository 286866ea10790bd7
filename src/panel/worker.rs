//! The control-surface worker loop.

use std::sync::mpsc::Receiver;
use std::sync::{Arc, Weak};

use log::{debug, error, info, warn};

use super::gesture::{self, DragGesture, DragKind};
use super::{ControlTarget, PanelMessage, PanelShared, TouchEvent, TouchPhase};
use crate::config::ViewportConfig;
use crate::controller::ModeController;
use crate::host::{DisplayInfo, Environment, OverlayHost, SurfaceKind, SurfaceSpec};
use crate::mode::{Horizontal, ViewportMode};
use crate::monitor::{Operation, OperationMonitor};
use crate::settings::Settings;
use crate::transform::compute_transform;

/// Single consumer of the surface queue.
///
/// Holds only a weak reference to the controller and talks to it through its
/// public, lock-guarded API.
pub(crate) struct PanelWorker {
    controller: Weak<ModeController>,
    overlays: Arc<dyn OverlayHost>,
    environment: Arc<dyn Environment>,
    settings: Arc<Settings>,
    monitor: Arc<OperationMonitor>,
    shared: Arc<PanelShared>,
    config: ViewportConfig,
    installed: bool,
    display: DisplayInfo,
    button_side: Option<Horizontal>,
    slippery: bool,
    drag: Option<DragGesture>,
}

impl PanelWorker {
    pub(crate) fn new(
        controller: Weak<ModeController>,
        overlays: Arc<dyn OverlayHost>,
        environment: Arc<dyn Environment>,
        settings: Arc<Settings>,
        monitor: Arc<OperationMonitor>,
        shared: Arc<PanelShared>,
        config: ViewportConfig,
    ) -> Self {
        Self {
            controller,
            overlays,
            environment,
            settings,
            monitor,
            shared,
            config,
            installed: false,
            display: DisplayInfo::default(),
            button_side: None,
            slippery: true,
            drag: None,
        }
    }

    pub(crate) fn run(mut self, rx: Receiver<PanelMessage>) {
        while let Ok(message) = rx.recv() {
            // The wanted flag is authoritative; a dropped Reconcile message
            // is picked up by whatever message comes next.
            self.reconcile();

            match message {
                PanelMessage::Reconcile => {}
                PanelMessage::ModeChanged => self.shared.clear_mode_pending(),
                PanelMessage::Recreate => self.recreate(),
                PanelMessage::OutsideTouch { x, y } => self.outside_touch(x, y),
                PanelMessage::Touch { target, event } => self.touch(target, event),
                PanelMessage::Barrier(ack) => {
                    let _ = ack.send(());
                }
                PanelMessage::Shutdown => break,
            }

            // Gestures handled above may have changed the mode themselves.
            self.dock_buttons();
        }

        if self.installed {
            self.remove_surfaces();
        }
        debug!("surface worker stopped");
    }

    // =========================================================================
    // Surface lifecycle
    // =========================================================================

    fn reconcile(&mut self) {
        match (self.shared.wanted(), self.installed) {
            (true, false) => self.install_surfaces(),
            (false, true) => self.remove_surfaces(),
            _ => {}
        }
    }

    fn guide_spec(&self) -> SurfaceSpec {
        SurfaceSpec {
            kind: SurfaceKind::Guide,
            x: 0,
            y: 0,
            width: self.display.width,
            height: self.display.height,
            touchable: false,
            slippery: false,
        }
    }

    fn control_spec(&self) -> SurfaceSpec {
        let t = self.config.surface_thickness;
        SurfaceSpec {
            kind: SurfaceKind::Control,
            x: -t,
            y: -t,
            width: self.display.width + 2 * t,
            height: self.display.height + 2 * t,
            touchable: true,
            slippery: self.slippery,
        }
    }

    fn install_surfaces(&mut self) {
        self.display = match self.environment.display_info() {
            Ok(display) => display,
            Err(e) => {
                error!("cannot install control surfaces: {e}");
                return;
            }
        };

        if let Err(e) = self.overlays.add_surface(&self.guide_spec()) {
            error!("failed to add guide surface: {e}");
            return;
        }
        if let Err(e) = self.overlays.add_surface(&self.control_spec()) {
            error!("failed to add control surface: {e}");
            if let Err(e) = self.overlays.remove_surface(SurfaceKind::Guide) {
                warn!("failed to roll back guide surface: {e}");
            }
            return;
        }

        self.installed = true;
        let guide_bottom = self.overlays.guide_bounds().map_or(0, |r| r.bottom);
        self.shared.set_installed(true, guide_bottom);
        self.button_side = None;
        debug!("control surfaces installed for {}x{}", self.display.width, self.display.height);
        self.dock_buttons();
    }

    fn remove_surfaces(&mut self) {
        for kind in [SurfaceKind::Control, SurfaceKind::Guide] {
            if let Err(e) = self.overlays.remove_surface(kind) {
                warn!("failed to remove {kind:?} surface: {e}");
            }
        }
        self.installed = false;
        self.shared.set_installed(false, 0);
        self.button_side = None;
        self.slippery = true;

        if self.drag.take().is_some()
            && let Some(controller) = self.controller.upgrade()
        {
            controller.resume_pointer_sync();
        }
        debug!("control surfaces removed");
    }

    fn recreate(&mut self) {
        if !self.installed {
            return;
        }
        self.remove_surfaces();
        if self.shared.wanted() {
            self.install_surfaces();
        }
    }

    /// Dock the buttons opposite the anchor; the host only hears about changes.
    fn dock_buttons(&mut self) {
        if !self.installed {
            return;
        }
        let Some(controller) = self.controller.upgrade() else {
            return;
        };
        let mode = controller.mode();
        if mode.is_off() {
            return;
        }

        let side = mode.anchor().horizontal.flipped();
        if self.button_side != Some(side) {
            self.overlays.set_button_side(side);
            self.button_side = Some(side);
        }
    }

    fn set_slippery(&mut self, slippery: bool) {
        if self.slippery == slippery {
            return;
        }
        self.slippery = slippery;
        if self.installed
            && let Err(e) = self.overlays.update_surface(&self.control_spec())
        {
            warn!("failed to update control surface: {e}");
        }
    }

    // =========================================================================
    // Touch handling
    // =========================================================================

    fn outside_touch(&mut self, x: f32, y: f32) {
        let Some(controller) = self.controller.upgrade() else {
            return;
        };
        let mode = controller.mode();
        if mode.is_off() {
            return;
        }

        let display = controller.display();
        let transform = compute_transform(&mode, display.width, display.height);
        let (px, py) = transform.map_point(x, y);

        if let Some(bounds) = self.overlays.guide_bounds()
            && bounds.contains(px.round() as i32, py.round() as i32)
        {
            info!("settings hot-zone touched, launching setup");
            if let Err(e) = self.overlays.launch_setup() {
                error!("failed to launch setup: {e}");
            }
            return;
        }

        self.exit_outside(&controller);
    }

    fn exit_outside(&self, controller: &ModeController) {
        self.monitor.push(Operation::ExitOutside);
        controller.request_mode(ViewportMode::OFF, false);
    }

    fn touch(&mut self, target: ControlTarget, event: TouchEvent) {
        let Some(controller) = self.controller.upgrade() else {
            return;
        };
        if !self.installed {
            return;
        }

        match target {
            ControlTarget::DragHandle => self.drag_handle(&controller, DragKind::Move, event),
            ControlTarget::ResizeHandle => self.drag_handle(&controller, DragKind::Resize, event),
            ControlTarget::FlipButton => {
                if event.phase == TouchPhase::Up {
                    self.flip(&controller);
                }
            }
            ControlTarget::Backdrop => {
                if event.phase == TouchPhase::Up {
                    self.backdrop_release(&controller, event.x, event.y);
                }
            }
        }
    }

    fn drag_handle(&mut self, controller: &ModeController, kind: DragKind, event: TouchEvent) {
        match event.phase {
            TouchPhase::Down => {
                let mode = controller.mode();
                if mode.is_off() {
                    return;
                }
                controller.suspend_pointer_sync();
                self.drag = Some(DragGesture::begin(kind, mode, event.x, event.y));
                self.set_slippery(false);
            }
            TouchPhase::Move => {
                let Some(drag) = self.drag.filter(|d| d.kind() == kind) else {
                    return;
                };
                let display = controller.display();
                let Some(updated) = drag.update(event.x, event.y, display, self.config.surface_thickness) else {
                    return;
                };
                if controller.request_mode(updated, true) {
                    match kind {
                        DragKind::Move => self.settings.save_y_offset(updated.y_offset()),
                        DragKind::Resize => self.settings.save_scale(updated.scale()),
                    }
                }
            }
            TouchPhase::Up | TouchPhase::Cancel => {
                if self.drag.take_if(|d| d.kind() == kind).is_none() {
                    return;
                }
                controller.resume_pointer_sync();
                self.set_slippery(true);
                self.monitor.push(match kind {
                    DragKind::Move => Operation::Move,
                    DragKind::Resize => Operation::Resize,
                });
            }
        }
    }

    fn flip(&mut self, controller: &ModeController) {
        let mode = controller.mode();
        if mode.is_off() {
            return;
        }

        let flipped = gesture::flip(mode);
        self.settings.save_anchor(flipped.anchor());
        self.monitor.push(match flipped.anchor().horizontal {
            Horizontal::Left => Operation::SwipeLeft,
            Horizontal::Right => Operation::SwipeRight,
        });
        controller.request_mode(flipped, false);
    }

    fn backdrop_release(&mut self, controller: &ModeController, x: f32, y: f32) {
        let mode = controller.mode();
        if mode.is_off() {
            return;
        }

        let zone = gesture::protect_zone(
            self.display,
            self.config.surface_thickness,
            self.config.protect_zone_padding,
            mode.scale(),
        );
        if gesture::zone_contains(zone, x, y) {
            return;
        }
        self.exit_outside(controller);
    }
}
