//! The viewport mode controller.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, error, info, trace, warn};
use parking_lot::Mutex;

use crate::animation::Transition;
use crate::config::{Session, UserId, ViewportConfig};
use crate::error::ViewportError;
use crate::host::{DisplayInfo, HostServices, ModeListener, PointerMapping, SurfaceKind};
use crate::mode::ViewportMode;
use crate::monitor::OperationMonitor;
use crate::panel::{self, ControlSurfaces, ControlTarget, PanelWorker, SurfaceTransform, TouchEvent};
use crate::policy::{self, AvailabilityFlags};
use crate::settings::Settings;
use crate::state::ControllerState;
use crate::transform::{compute_transform, sanitize, Rect, Transform};

/// How long an immediate exit waits for the surfaces to be torn down.
const SURFACE_REMOVAL_TIMEOUT: Duration = Duration::from_secs(1);

// =============================================================================
// Listener handles
// =============================================================================

/// Handle returned by [`ModeController::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

// =============================================================================
// Pointer-remap activity
// =============================================================================

/// Debounced "remap active" flag: set at once for a non-1 scale, cleared only
/// after the mapping stayed at scale 1 for the configured delay. Every scale-1
/// push re-arms the delay.
#[derive(Debug, Clone, Copy, Default)]
struct RemapActivity {
    active: bool,
    inactive_at: Option<Instant>,
}

impl RemapActivity {
    fn settle(&mut self, now: Instant) {
        if let Some(at) = self.inactive_at
            && now >= at
        {
            self.active = false;
            self.inactive_at = None;
        }
    }

    fn record(&mut self, scale: f32, now: Instant, delay: Duration) {
        self.settle(now);
        if scale != 1.0 {
            self.active = true;
            self.inactive_at = None;
        } else if self.active {
            self.inactive_at = Some(now + delay);
        }
    }

    fn is_active(&self, now: Instant) -> bool {
        self.active && self.inactive_at.is_none_or(|at| now < at)
    }
}

// =============================================================================
// Mode Controller
// =============================================================================

/// Everything guarded by the coarse lock shared with the frame pump.
pub(crate) struct Inner {
    pub(crate) mode: ViewportMode,
    pub(crate) transition: Option<Transition>,
    pub(crate) flags: AvailabilityFlags,
    pub(crate) display: DisplayInfo,
    pub(crate) user: UserId,
    pointer_suspended: bool,
    mapping: PointerMapping,
    remap: RemapActivity,
}

impl Inner {
    /// Live transform: the in-flight one, else the direct one of the mode.
    fn live_transform(&self) -> Transform {
        match &self.transition {
            Some(transition) => transition.live(),
            None => compute_transform(&self.mode, self.display.width, self.display.height),
        }
    }

    fn target_transform(&self) -> Transform {
        compute_transform(&self.mode, self.display.width, self.display.height)
    }
}

/// Owns the current viewport mode and drives transitions between modes.
///
/// All state sits behind one mutex that [`ModeController::step`] shares with
/// every other entry point. `step` never blocks on I/O, and overlay surface
/// work is handed to a worker thread.
pub struct ModeController {
    pub(crate) state: Mutex<Inner>,
    pub(crate) config: ViewportConfig,
    pub(crate) services: HostServices,
    pub(crate) settings: Arc<Settings>,
    pub(crate) monitor: Arc<OperationMonitor>,
    listeners: Mutex<Vec<(ListenerId, Arc<dyn ModeListener>)>>,
    next_listener: AtomicU64,
    /// Last mapping handed to the input stack. Lock order: this, then `state`.
    published: Mutex<PointerMapping>,
    panel: ControlSurfaces,
}

/// Host work left over by [`ModeController::apply`] for after the state
/// lock is released.
#[must_use]
struct Applied {
    crossing: Option<bool>,
}

impl fmt::Debug for ModeController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModeController")
            .field("mode", &self.mode())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ModeController {
    /// Create a controller for `session` and start its surface worker.
    ///
    /// The controller starts in the off mode. A failing geometry query is
    /// logged and leaves an empty container until the next display event.
    ///
    /// # Errors
    /// Returns [`ViewportError::Io`] if the worker thread cannot be spawned.
    pub fn new(config: ViewportConfig, session: Session, services: HostServices) -> Result<Arc<Self>, ViewportError> {
        let settings = Arc::new(Settings::new(services.settings.clone(), session.user));
        let monitor = Arc::new(OperationMonitor::new(
            services.foreground.clone(),
            services.telemetry.clone(),
        ));

        let display = services.environment.display_info().unwrap_or_else(|e| {
            error!("failed to query display geometry: {e}");
            DisplayInfo::default()
        });
        let flags = AvailabilityFlags::query(
            services.environment.as_ref(),
            session.user,
            settings.is_feature_enabled(),
        );

        let (panel, rx, shared) = ControlSurfaces::channel(config.queue_capacity);
        let controller = Arc::new(Self {
            state: Mutex::new(Inner {
                mode: ViewportMode::OFF,
                transition: None,
                flags,
                display,
                user: session.user,
                pointer_suspended: false,
                mapping: PointerMapping::identity(display),
                remap: RemapActivity::default(),
            }),
            config: config.clone(),
            services: services.clone(),
            settings: settings.clone(),
            monitor: monitor.clone(),
            listeners: Mutex::new(Vec::new()),
            next_listener: AtomicU64::new(1),
            published: Mutex::new(PointerMapping::identity(display)),
            panel,
        });

        let worker = PanelWorker::new(
            Arc::downgrade(&controller),
            services.overlays.clone(),
            services.environment.clone(),
            settings,
            monitor,
            shared,
            config,
        );
        controller.panel.start(worker, rx)?;

        info!(
            "viewport controller ready for user {} on {}x{}",
            session.user, display.width, display.height
        );
        Ok(controller)
    }

    // =========================================================================
    // Mode requests and animation
    // =========================================================================

    /// Request a new mode.
    ///
    /// Non-off modes are clamped to the container first, then rejected if the
    /// availability policy forbids entry or the geometry cannot be queried.
    /// Requesting the current mode is a no-op that returns `true`. Animated
    /// requests start from the live transform, so reversing mid-flight does
    /// not snap; immediate ones cancel any transition.
    pub fn request_mode(&self, mode: ViewportMode, immediate: bool) -> bool {
        let display = match self.services.environment.display_info() {
            Ok(display) => Some(display),
            Err(e) if !mode.is_off() => {
                error!("failed to query display geometry, ignoring {mode}: {e}");
                return false;
            }
            Err(e) => {
                warn!("failed to query display geometry, exiting anyway: {e}");
                None
            }
        };

        let (target, applied) = {
            let mut st = self.state.lock();
            if let Some(display) = display {
                st.display = display;
            }

            let target = sanitize(
                mode,
                st.display.width,
                st.display.height,
                self.config.surface_thickness,
            );
            if target == st.mode {
                trace!("already in {target}");
                return true;
            }

            if !target.is_off()
                && let Err(reason) = policy::evaluate(&st.flags, &st.display)
            {
                debug!("rejecting {target}: {reason}");
                return false;
            }

            let from = st.live_transform();
            (target, self.apply(&mut st, from, target, immediate))
        };

        info!("viewport mode -> {target} ({})", if immediate { "immediate" } else { "animated" });
        self.publish(applied, immediate);
        true
    }

    /// Install `target` as the current mode, starting from `from`.
    ///
    /// Only touches state and the surface queue; the host calls happen in
    /// [`Self::publish`] once the lock is released.
    fn apply(&self, st: &mut Inner, from: Transform, target: ViewportMode, immediate: bool) -> Applied {
        let was_off = st.mode.is_off();
        if was_off && !target.is_off() {
            self.panel.install();
        }

        st.mode = target;
        let to = st.target_transform();
        st.transition = if immediate || from == to {
            None
        } else {
            Some(Transition::new(from, to, self.config.transition_duration))
        };
        if target.is_off() && st.transition.is_none() {
            self.panel.remove();
        }

        self.record_pointer_mapping(st, to, Instant::now());
        self.panel.mode_changed();

        Applied {
            crossing: (was_off != target.is_off()).then_some(target.is_off()),
        }
    }

    /// Host side of an applied mode: frame request, pointer mapping, then
    /// listener fan-out and synchronous teardown. Runs outside the state lock.
    fn publish(&self, applied: Applied, immediate: bool) {
        self.services.compositor.schedule_animation();
        self.publish_pointer_mapping();

        let Some(exited) = applied.crossing else {
            return;
        };
        self.notify_listeners(exited);
        if exited && immediate && !self.panel.wait_idle(SURFACE_REMOVAL_TIMEOUT) {
            debug!("surface teardown not confirmed");
        }
    }

    /// Advance the in-flight transition to `now`.
    ///
    /// Returns whether another frame is needed. Constant time, allocation
    /// free and never touches I/O; when an exit completes, teardown of the
    /// surfaces is queued for the worker.
    pub fn step(&self, now: Instant) -> bool {
        let mut st = self.state.lock();
        let Some(transition) = st.transition.as_mut() else {
            return false;
        };
        if transition.advance(now) {
            return true;
        }

        st.transition = None;
        if st.mode.is_off() {
            self.panel.remove();
        }
        debug!("transition settled");
        false
    }

    /// Transform the compositor should apply now, `None` when fully off.
    pub fn current_transform(&self) -> Option<Transform> {
        let st = self.state.lock();
        match &st.transition {
            Some(transition) => Some(transition.live()),
            None if st.mode.is_off() => None,
            None => Some(st.target_transform()),
        }
    }

    /// Map `rect` through the current transform; unchanged when off.
    pub fn map_rect(&self, rect: Rect) -> Rect {
        self.current_transform().map_or(rect, |t| t.map_rect(rect))
    }

    /// The authoritative logical mode.
    pub fn mode(&self) -> ViewportMode {
        self.state.lock().mode
    }

    /// Last known container geometry.
    pub fn display(&self) -> DisplayInfo {
        self.state.lock().display
    }

    /// Whether a non-off mode could be entered right now.
    ///
    /// Queries the geometry afresh and evaluates it against the cached flags.
    pub fn is_available(&self) -> bool {
        let display = match self.services.environment.display_info() {
            Ok(display) => display,
            Err(e) => {
                warn!("failed to query display geometry: {e}");
                return false;
            }
        };
        let mut st = self.state.lock();
        st.display = display;
        policy::evaluate(&st.flags, &display).is_ok()
    }

    /// Scale a new entry starts with: the persisted one, else the default.
    pub fn saved_scale(&self) -> f32 {
        self.settings.scale(self.config.default_scale)
    }

    // =========================================================================
    // Pointer remapping
    // =========================================================================

    /// Record the mapping for `target` unless pointer sync is suspended.
    fn record_pointer_mapping(&self, st: &mut Inner, target: Transform, now: Instant) {
        if st.pointer_suspended {
            return;
        }
        st.remap.record(target.scale, now, self.config.remap_inactive_delay);
        st.mapping = PointerMapping::for_transform(&target, st.display);
    }

    /// Hand the latest recorded mapping to the input stack if it changed.
    ///
    /// Reads the mapping under `published`, so concurrent callers push in
    /// order and the last one wins.
    fn publish_pointer_mapping(&self) {
        let mut published = self.published.lock();
        let mapping = self.state.lock().mapping;
        if mapping != *published {
            *published = mapping;
            self.services.pointer.update_pointer_mapping(mapping);
        }
    }

    /// Freeze the pointer mapping at its last pushed value.
    pub fn suspend_pointer_sync(&self) {
        self.state.lock().pointer_suspended = true;
    }

    /// Resume pointer-mapping pushes and push the current target at once.
    pub fn resume_pointer_sync(&self) {
        {
            let mut st = self.state.lock();
            if !st.pointer_suspended {
                return;
            }
            st.pointer_suspended = false;
            let target = st.target_transform();
            self.record_pointer_mapping(&mut st, target, Instant::now());
        }
        self.publish_pointer_mapping();
    }

    /// Whether the input stack is (still) remapping touches.
    ///
    /// Turns on as soon as a shrunk mapping is pushed and off only after the
    /// mapping stayed at scale 1 for the configured delay.
    pub fn is_pointer_remap_active(&self) -> bool {
        self.state.lock().remap.is_active(Instant::now())
    }

    // =========================================================================
    // Listeners
    // =========================================================================

    /// Register an observer of off/non-off crossings.
    pub fn add_listener(&self, listener: Arc<dyn ModeListener>) -> ListenerId {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().push((id, listener));
        id
    }

    /// Unregister an observer. Returns whether it was registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(other, _)| *other != id);
        listeners.len() != before
    }

    fn notify_listeners(&self, exited: bool) {
        let listeners: Vec<_> = self.listeners.lock().iter().map(|(_, l)| l.clone()).collect();
        for listener in listeners {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                if exited {
                    listener.on_exit()
                } else {
                    listener.on_enter()
                }
            }));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("mode listener failed: {e}"),
                Err(_) => error!("mode listener panicked"),
            }
        }
    }

    // =========================================================================
    // Control surfaces
    // =========================================================================

    /// Report a touch outside the shrunk viewport, in screen coordinates of
    /// the unshrunk container.
    pub fn notify_outside_touch(&self, x: f32, y: f32) {
        if self.mode().is_off() {
            return;
        }
        self.panel.outside_touch(x, y);
    }

    /// Deliver a touch on one of the control-surface widgets.
    ///
    /// Never dropped: waits for room while the surface queue is full.
    pub fn dispatch_touch(&self, target: ControlTarget, event: TouchEvent) {
        self.panel.touch(target, event);
    }

    /// Transform and opacity for an overlay surface this frame.
    ///
    /// `None` while no surfaces are installed or nothing is transformed.
    pub fn surface_transform(&self, kind: SurfaceKind) -> Option<SurfaceTransform> {
        let (live, target) = {
            let st = self.state.lock();
            match &st.transition {
                Some(transition) => (transition.live(), transition.to()),
                None if st.mode.is_off() => return None,
                None => {
                    let target = st.target_transform();
                    (target, target)
                }
            }
        };
        if !self.panel.is_installed() {
            return None;
        }

        let progress = self.panel.progress_alpha(live.scale, target.scale);
        Some(match kind {
            SurfaceKind::Guide => {
                let bar_top = panel::alpha::control_bar_top(&live, self.config.surface_thickness);
                SurfaceTransform {
                    transform: Transform::IDENTITY,
                    alpha: progress * panel::alpha::proximity_alpha(bar_top, self.panel.guide_bottom()),
                }
            }
            SurfaceKind::Control => SurfaceTransform {
                transform: live,
                alpha: progress,
            },
        })
    }

    /// Re-create installed surfaces, e.g. after a configuration change.
    pub(crate) fn recreate_surfaces(&self) {
        self.panel.recreate();
    }

    /// Wait until the surface worker handled everything queued so far.
    ///
    /// Returns `false` on timeout or when called from the worker itself.
    pub fn wait_surfaces_idle(&self, timeout: Duration) -> bool {
        self.panel.wait_idle(timeout)
    }

    // =========================================================================
    // Environment-driven helpers
    // =========================================================================

    /// Re-query every availability flag for the current user.
    pub(crate) fn refresh_flags(&self) {
        let user = self.state.lock().user;
        let flags = AvailabilityFlags::query(
            self.services.environment.as_ref(),
            user,
            self.settings.is_feature_enabled(),
        );
        self.state.lock().flags = flags;
        trace!("availability flags: {flags:?}");
    }

    /// Force an immediate exit if the current mode is no longer permitted.
    pub(crate) fn enforce_policy(&self) {
        let violation = {
            let st = self.state.lock();
            if st.mode.is_off() {
                return;
            }
            policy::evaluate(&st.flags, &st.display).err()
        };
        if let Some(reason) = violation {
            info!("forcing exit: {reason}");
            self.request_mode(ViewportMode::OFF, true);
        }
    }

    /// Adopt new container geometry and re-fit the current mode to it.
    pub(crate) fn update_display(&self, display: DisplayInfo) {
        let (applied, violation) = {
            let mut st = self.state.lock();
            let from = st.live_transform();
            st.display = display;

            if st.mode.is_off() {
                self.record_pointer_mapping(&mut st, Transform::IDENTITY, Instant::now());
                (None, None)
            } else if let Err(reason) = policy::evaluate(&st.flags, &display) {
                (None, Some(reason))
            } else {
                let target = sanitize(st.mode, display.width, display.height, self.config.surface_thickness);
                let previous = st.mode;
                let applied = self.apply(&mut st, from, target, false);
                if target != previous {
                    debug!("re-fitted {previous} to {target}");
                }
                (Some(applied), None)
            }
        };

        if let Some(reason) = violation {
            info!("forcing exit after display change: {reason}");
            self.request_mode(ViewportMode::OFF, true);
            return;
        }
        match applied {
            Some(applied) => self.publish(applied, false),
            None => self.publish_pointer_mapping(),
        }
        self.recreate_surfaces();
    }

    /// Switch the session user.
    pub(crate) fn set_user(&self, user: UserId) {
        self.settings.set_user(user);
        self.state.lock().user = user;
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// Snapshot of the controller state.
    pub fn state(&self) -> ControllerState {
        let listener_count = self.listeners.lock().len();
        let st = self.state.lock();
        ControllerState {
            mode: st.mode,
            transition: st.transition.as_ref().map(Transition::live),
            flags: st.flags,
            display: st.display,
            pointer_mapping: st.mapping,
            pointer_sync_suspended: st.pointer_suspended,
            surfaces_installed: self.panel.is_wanted(),
            listener_count,
            user: st.user,
        }
    }
}

impl Drop for ModeController {
    fn drop(&mut self) {
        self.panel.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remap_turns_on_at_once_and_off_after_delay() {
        let delay = Duration::from_millis(700);
        let t0 = Instant::now();
        let mut remap = RemapActivity::default();
        assert!(!remap.is_active(t0));

        remap.record(0.75, t0, delay);
        assert!(remap.is_active(t0));

        remap.record(1.0, t0, delay);
        assert!(remap.is_active(t0 + Duration::from_millis(699)));
        assert!(!remap.is_active(t0 + delay));
    }

    #[test]
    fn remap_deactivation_is_cancelled_by_new_scale() {
        let delay = Duration::from_millis(700);
        let t0 = Instant::now();
        let mut remap = RemapActivity::default();

        remap.record(0.75, t0, delay);
        remap.record(1.0, t0, delay);
        remap.record(0.8, t0 + Duration::from_millis(300), delay);
        assert!(remap.is_active(t0 + Duration::from_secs(5)));
    }

    #[test]
    fn remap_deadline_is_rearmed_by_repeated_identity() {
        let delay = Duration::from_millis(700);
        let t0 = Instant::now();
        let mut remap = RemapActivity::default();

        remap.record(0.75, t0, delay);
        remap.record(1.0, t0, delay);
        remap.record(1.0, t0 + Duration::from_millis(500), delay);
        assert!(remap.is_active(t0 + Duration::from_millis(800)));
        assert!(remap.is_active(t0 + Duration::from_millis(1199)));
        assert!(!remap.is_active(t0 + Duration::from_millis(1200)));
    }

    #[test]
    fn remap_identity_after_expiry_stays_inactive() {
        let delay = Duration::from_millis(700);
        let t0 = Instant::now();
        let mut remap = RemapActivity::default();

        remap.record(0.75, t0, delay);
        remap.record(1.0, t0, delay);
        remap.record(1.0, t0 + Duration::from_secs(1), delay);
        assert!(!remap.is_active(t0 + Duration::from_secs(1)));
    }
}
