//! Mock host for testing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::UserId;
use crate::error::ViewportError;
use crate::host::{
    DisplayInfo, Environment, ForegroundContext, ForegroundProbe, HostCompositor, HostServices, ModeListener,
    OverlayHost, PointerMapper, PointerMapping, SurfaceKind, SurfaceSpec,
};
use crate::mode::Horizontal;
use crate::monitor::{OperationEvent, OperationSink};
use crate::settings::{MemorySettingsStore, SettingValue, Settings, SettingsStore};
use crate::transform::Rect;

#[derive(Debug)]
struct MockState {
    display: DisplayInfo,
    geometry_fails: bool,
    wireless_charging: bool,
    accessibility_conflict: bool,
    presentation_display: bool,
    setup_complete: bool,
    foreground: ForegroundContext,
    guide_bounds: Option<Rect>,
    pointer_mappings: Vec<PointerMapping>,
    surfaces: Vec<SurfaceSpec>,
    surface_updates: usize,
    button_side: Option<Horizontal>,
    setup_launches: usize,
    operations: Vec<OperationEvent>,
}

/// A mock host implementing every collaborator trait.
///
/// This allows testing a [`ModeController`](crate::ModeController) without a
/// real compositor, input stack or settings provider. Environment answers are
/// settable, and everything the controller pushes is recorded.
///
/// # Example
///
/// ```
/// use shrinkview_core::{MockHost, ModeController, Session, ViewportConfig};
///
/// let host = MockHost::new();
/// host.set_feature_enabled(0, true);
/// let controller = ModeController::new(ViewportConfig::default(), Session::new(0), host.services()).unwrap();
/// assert!(controller.is_available());
/// ```
#[derive(Debug)]
pub struct MockHost {
    state: Mutex<MockState>,
    store: Arc<MemorySettingsStore>,
    scheduled: AtomicUsize,
    environment_queries: AtomicUsize,
    settings_accesses: AtomicUsize,
}

impl MockHost {
    /// A 1080x1920 portrait host with setup complete and nothing conflicting.
    pub fn new() -> Arc<Self> {
        Self::with_display(DisplayInfo::new(1080, 1920))
    }

    /// A host with a custom display.
    pub fn with_display(display: DisplayInfo) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(MockState {
                display,
                geometry_fails: false,
                wireless_charging: false,
                accessibility_conflict: false,
                presentation_display: false,
                setup_complete: true,
                foreground: ForegroundContext::App("com.example.launcher".to_string()),
                guide_bounds: None,
                pointer_mappings: Vec::new(),
                surfaces: Vec::new(),
                surface_updates: 0,
                button_side: None,
                setup_launches: 0,
                operations: Vec::new(),
            }),
            store: Arc::new(MemorySettingsStore::new()),
            scheduled: AtomicUsize::new(0),
            environment_queries: AtomicUsize::new(0),
            settings_accesses: AtomicUsize::new(0),
        })
    }

    /// Bundle this host as the controller's collaborators.
    pub fn services(self: &Arc<Self>) -> HostServices {
        HostServices {
            compositor: self.clone(),
            pointer: self.clone(),
            environment: self.clone(),
            overlays: self.clone(),
            settings: self.clone(),
            foreground: self.clone(),
            telemetry: Some(self.clone()),
        }
    }

    // =========================================================================
    // Environment knobs
    // =========================================================================

    /// Change the display size.
    pub fn set_display(&self, width: i32, height: i32) {
        self.state.lock().display = DisplayInfo::new(width, height);
    }

    /// Make geometry queries fail.
    pub fn set_geometry_fails(&self, fails: bool) {
        self.state.lock().geometry_fails = fails;
    }

    /// Set the wireless-charging signal.
    pub fn set_wireless_charging(&self, charging: bool) {
        self.state.lock().wireless_charging = charging;
    }

    /// Set the conflicting-accessibility signal.
    pub fn set_accessibility_conflict(&self, active: bool) {
        self.state.lock().accessibility_conflict = active;
    }

    /// Set the presentation-display signal.
    pub fn set_presentation_display(&self, attached: bool) {
        self.state.lock().presentation_display = attached;
    }

    /// Set whether every user finished setup.
    pub fn set_setup_complete(&self, complete: bool) {
        self.state.lock().setup_complete = complete;
    }

    /// Set the foreground reported to operation records.
    pub fn set_foreground(&self, foreground: ForegroundContext) {
        self.state.lock().foreground = foreground;
    }

    /// Set the guide's settings hot-zone.
    pub fn set_guide_bounds(&self, bounds: Option<Rect>) {
        self.state.lock().guide_bounds = bounds;
    }

    /// Write the persisted feature flag for `user`.
    pub fn set_feature_enabled(&self, user: UserId, enabled: bool) {
        Settings::new(self.store.clone(), user).set_feature_enabled(user, enabled);
    }

    /// A typed view of the persisted settings for `user`.
    pub fn settings(self: &Arc<Self>, user: UserId) -> Settings {
        Settings::new(self.clone(), user)
    }

    // =========================================================================
    // Recorded output
    // =========================================================================

    /// Every pointer mapping pushed so far.
    pub fn pointer_mappings(&self) -> Vec<PointerMapping> {
        self.state.lock().pointer_mappings.clone()
    }

    /// The last pointer mapping pushed.
    pub fn last_pointer_mapping(&self) -> Option<PointerMapping> {
        self.state.lock().pointer_mappings.last().copied()
    }

    /// Surfaces currently present.
    pub fn surfaces(&self) -> Vec<SurfaceSpec> {
        self.state.lock().surfaces.clone()
    }

    /// The present surface of `kind`, if any.
    pub fn surface(&self, kind: SurfaceKind) -> Option<SurfaceSpec> {
        self.state.lock().surfaces.iter().find(|s| s.kind == kind).copied()
    }

    /// Number of surface re-layouts.
    pub fn surface_updates(&self) -> usize {
        self.state.lock().surface_updates
    }

    /// Side the buttons were last docked to.
    pub fn button_side(&self) -> Option<Horizontal> {
        self.state.lock().button_side
    }

    /// Number of setup-flow launches.
    pub fn setup_launches(&self) -> usize {
        self.state.lock().setup_launches
    }

    /// Operation records delivered to the telemetry sink.
    pub fn operations(&self) -> Vec<OperationEvent> {
        self.state.lock().operations.clone()
    }

    /// Number of frames requested.
    pub fn scheduled_frames(&self) -> usize {
        self.scheduled.load(Ordering::SeqCst)
    }

    /// Number of environment queries answered.
    pub fn environment_queries(&self) -> usize {
        self.environment_queries.load(Ordering::SeqCst)
    }

    /// Number of settings reads and writes.
    pub fn settings_accesses(&self) -> usize {
        self.settings_accesses.load(Ordering::SeqCst)
    }

    fn count_query(&self) {
        self.environment_queries.fetch_add(1, Ordering::SeqCst);
    }
}

// =============================================================================
// Collaborator impls
// =============================================================================

impl HostCompositor for MockHost {
    fn schedule_animation(&self) {
        self.scheduled.fetch_add(1, Ordering::SeqCst);
    }
}

impl PointerMapper for MockHost {
    fn update_pointer_mapping(&self, mapping: PointerMapping) {
        self.state.lock().pointer_mappings.push(mapping);
    }
}

impl Environment for MockHost {
    fn display_info(&self) -> Result<DisplayInfo, ViewportError> {
        self.count_query();
        let state = self.state.lock();
        if state.geometry_fails {
            return Err(ViewportError::GeometryUnavailable("mock display offline".to_string()));
        }
        Ok(state.display)
    }

    fn is_wireless_charging(&self) -> bool {
        self.count_query();
        self.state.lock().wireless_charging
    }

    fn is_user_setup_complete(&self, _user: u32) -> bool {
        self.count_query();
        self.state.lock().setup_complete
    }

    fn has_conflicting_accessibility(&self, _user: u32) -> bool {
        self.count_query();
        self.state.lock().accessibility_conflict
    }

    fn has_presentation_display(&self) -> bool {
        self.count_query();
        self.state.lock().presentation_display
    }
}

impl OverlayHost for MockHost {
    fn add_surface(&self, spec: &SurfaceSpec) -> Result<(), ViewportError> {
        let mut state = self.state.lock();
        if state.surfaces.iter().any(|s| s.kind == spec.kind) {
            return Err(ViewportError::Surface(format!("{:?} surface already added", spec.kind)));
        }
        state.surfaces.push(*spec);
        Ok(())
    }

    fn update_surface(&self, spec: &SurfaceSpec) -> Result<(), ViewportError> {
        let mut state = self.state.lock();
        let Some(existing) = state.surfaces.iter_mut().find(|s| s.kind == spec.kind) else {
            return Err(ViewportError::Surface(format!("{:?} surface not added", spec.kind)));
        };
        *existing = *spec;
        state.surface_updates += 1;
        Ok(())
    }

    fn remove_surface(&self, kind: SurfaceKind) -> Result<(), ViewportError> {
        let mut state = self.state.lock();
        let before = state.surfaces.len();
        state.surfaces.retain(|s| s.kind != kind);
        if state.surfaces.len() == before {
            return Err(ViewportError::Surface(format!("{kind:?} surface not added")));
        }
        Ok(())
    }

    fn set_button_side(&self, side: Horizontal) {
        self.state.lock().button_side = Some(side);
    }

    fn guide_bounds(&self) -> Option<Rect> {
        self.state.lock().guide_bounds
    }

    fn launch_setup(&self) -> Result<(), ViewportError> {
        self.state.lock().setup_launches += 1;
        Ok(())
    }
}

impl SettingsStore for MockHost {
    fn get(&self, user: UserId, key: &str) -> Option<SettingValue> {
        self.settings_accesses.fetch_add(1, Ordering::SeqCst);
        self.store.get(user, key)
    }

    fn put(&self, user: UserId, key: &str, value: SettingValue) -> Result<(), ViewportError> {
        self.settings_accesses.fetch_add(1, Ordering::SeqCst);
        self.store.put(user, key, value)
    }
}

impl ForegroundProbe for MockHost {
    fn foreground(&self) -> ForegroundContext {
        self.state.lock().foreground.clone()
    }
}

impl OperationSink for MockHost {
    fn record(&self, event: &OperationEvent) -> Result<(), ViewportError> {
        self.state.lock().operations.push(event.clone());
        Ok(())
    }
}

/// A listener counting the crossings it sees.
#[derive(Debug, Default)]
pub struct MockListener {
    enters: AtomicUsize,
    exits: AtomicUsize,
}

impl MockListener {
    /// Create a listener with zero counts.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of `on_enter` calls.
    pub fn enters(&self) -> usize {
        self.enters.load(Ordering::SeqCst)
    }

    /// Number of `on_exit` calls.
    pub fn exits(&self) -> usize {
        self.exits.load(Ordering::SeqCst)
    }
}

impl ModeListener for MockListener {
    fn on_enter(&self) -> Result<(), ViewportError> {
        self.enters.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn on_exit(&self) -> Result<(), ViewportError> {
        self.exits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
