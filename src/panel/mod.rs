//! Control-surface manager.
//!
//! Owns the overlay surfaces drawn around the shrunk viewport and the gesture
//! state of their handles. All surface I/O and gesture handling happens on a
//! dedicated worker thread fed by a bounded queue; the controller only ever
//! posts messages here, so slow surface creation never holds the controller
//! lock the frame pump needs.

pub mod alpha;
pub mod gesture;
mod worker;

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;

use log::{debug, warn};
use parking_lot::Mutex;

use crate::error::ViewportError;
use crate::transform::Transform;

pub(crate) use worker::PanelWorker;

const WORKER_NAME: &str = "shrinkview-surfaces";

// =============================================================================
// Touch input delivered by the host
// =============================================================================

/// The widget of the control surface a touch landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlTarget {
    /// Handle that moves the viewport vertically.
    DragHandle,
    /// Handle that changes the scale.
    ResizeHandle,
    /// Button that docks the viewport to the other side.
    FlipButton,
    /// Empty area of the control surface around the viewport.
    Backdrop,
}

/// Phase of a touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TouchPhase {
    /// First contact.
    Down,
    /// Contact moved.
    Move,
    /// Contact lifted.
    Up,
    /// Gesture aborted by the host.
    Cancel,
}

/// A touch on the control surface, in the surface's local coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchEvent {
    /// Phase of the touch.
    pub phase: TouchPhase,
    /// Local x.
    pub x: f32,
    /// Local y.
    pub y: f32,
}

impl TouchEvent {
    /// Touch with the given phase at `(x, y)`.
    pub fn new(phase: TouchPhase, x: f32, y: f32) -> Self {
        Self { phase, x, y }
    }
}

/// Transform and opacity the host applies to one overlay surface this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceTransform {
    /// Transform of the surface.
    pub transform: Transform,
    /// Opacity in `[0, 1]`.
    pub alpha: f32,
}

// =============================================================================
// Worker messages and shared flags
// =============================================================================

pub(crate) enum PanelMessage {
    /// Bring the installed surfaces in line with the wanted flag.
    Reconcile,
    /// Tear down and re-create installed surfaces (geometry changed).
    Recreate,
    /// The controller's mode changed.
    ModeChanged,
    /// A touch landed outside the shrunk viewport.
    OutsideTouch { x: f32, y: f32 },
    /// A touch on the control surface.
    Touch { target: ControlTarget, event: TouchEvent },
    /// Acknowledge once every earlier message was handled.
    Barrier(SyncSender<()>),
    Shutdown,
}

/// State shared between the controller and the worker without a lock.
#[derive(Debug)]
pub(crate) struct PanelShared {
    wanted: AtomicBool,
    installed: AtomicBool,
    mode_pending: AtomicBool,
    guide_bottom: AtomicI32,
    last_target_scale: AtomicU32,
}

impl Default for PanelShared {
    fn default() -> Self {
        Self {
            wanted: AtomicBool::new(false),
            installed: AtomicBool::new(false),
            mode_pending: AtomicBool::new(false),
            guide_bottom: AtomicI32::new(0),
            last_target_scale: AtomicU32::new(1.0f32.to_bits()),
        }
    }
}

impl PanelShared {
    pub(crate) fn wanted(&self) -> bool {
        self.wanted.load(Ordering::SeqCst)
    }

    pub(crate) fn installed(&self) -> bool {
        self.installed.load(Ordering::SeqCst)
    }

    pub(crate) fn clear_mode_pending(&self) {
        self.mode_pending.store(false, Ordering::SeqCst);
    }

    pub(crate) fn set_installed(&self, installed: bool, guide_bottom: i32) {
        self.guide_bottom.store(guide_bottom, Ordering::SeqCst);
        self.installed.store(installed, Ordering::SeqCst);
    }

    pub(crate) fn guide_bottom(&self) -> i32 {
        self.guide_bottom.load(Ordering::SeqCst)
    }
}

// =============================================================================
// Controller-side handle
// =============================================================================

/// Controller-side handle to the worker.
///
/// Lifecycle and mode notifications never block and may be dropped; the
/// worker re-reads the shared flags on every message. Touches block while the
/// queue is full so a gesture's end always reaches the worker, as does
/// [`ControlSurfaces::wait_idle`].
pub(crate) struct ControlSurfaces {
    tx: SyncSender<PanelMessage>,
    shared: Arc<PanelShared>,
    worker: Mutex<Option<JoinHandle<()>>>,
    worker_id: Mutex<Option<ThreadId>>,
}

impl ControlSurfaces {
    /// Create the handle and the queue the worker will consume.
    pub(crate) fn channel(capacity: usize) -> (Self, Receiver<PanelMessage>, Arc<PanelShared>) {
        let (tx, rx) = mpsc::sync_channel(capacity);
        let shared = Arc::new(PanelShared::default());
        let handle = Self {
            tx,
            shared: shared.clone(),
            worker: Mutex::new(None),
            worker_id: Mutex::new(None),
        };
        (handle, rx, shared)
    }

    /// Start consuming `rx` on a dedicated thread.
    pub(crate) fn start(&self, worker: PanelWorker, rx: Receiver<PanelMessage>) -> Result<(), ViewportError> {
        let handle = thread::Builder::new()
            .name(WORKER_NAME.to_string())
            .spawn(move || worker.run(rx))?;
        *self.worker_id.lock() = Some(handle.thread().id());
        *self.worker.lock() = Some(handle);
        debug!("{WORKER_NAME} worker started");
        Ok(())
    }

    fn post(&self, message: PanelMessage) {
        match self.tx.try_send(message) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => warn!("surface queue full, dropping message"),
            Err(TrySendError::Disconnected(_)) => debug!("surface worker stopped, dropping message"),
        }
    }

    /// Post a message that must not be lost. Falls back to [`Self::post`]
    /// on the worker thread, which would otherwise wait on itself.
    fn deliver(&self, message: PanelMessage) {
        if self.on_worker_thread() {
            self.post(message);
            return;
        }
        if self.tx.send(message).is_err() {
            debug!("surface worker stopped, dropping message");
        }
    }

    fn on_worker_thread(&self) -> bool {
        *self.worker_id.lock() == Some(thread::current().id())
    }

    pub(crate) fn install(&self) {
        self.shared.wanted.store(true, Ordering::SeqCst);
        self.post(PanelMessage::Reconcile);
    }

    pub(crate) fn remove(&self) {
        self.shared.wanted.store(false, Ordering::SeqCst);
        self.post(PanelMessage::Reconcile);
    }

    pub(crate) fn recreate(&self) {
        self.post(PanelMessage::Recreate);
    }

    /// At most one `ModeChanged` is queued at a time.
    pub(crate) fn mode_changed(&self) {
        if self.shared.mode_pending.swap(true, Ordering::SeqCst) {
            return;
        }
        if self.tx.try_send(PanelMessage::ModeChanged).is_err() {
            self.shared.mode_pending.store(false, Ordering::SeqCst);
            debug!("surface queue busy, mode change folded into the next message");
        }
    }

    pub(crate) fn outside_touch(&self, x: f32, y: f32) {
        self.deliver(PanelMessage::OutsideTouch { x, y });
    }

    pub(crate) fn touch(&self, target: ControlTarget, event: TouchEvent) {
        self.deliver(PanelMessage::Touch { target, event });
    }

    pub(crate) fn is_wanted(&self) -> bool {
        self.shared.wanted()
    }

    pub(crate) fn is_installed(&self) -> bool {
        self.shared.installed()
    }

    /// Guide opacity factor for the live scale, tracking the last non-1 target.
    pub(crate) fn progress_alpha(&self, current_scale: f32, target_scale: f32) -> f32 {
        let mut last = f32::from_bits(self.shared.last_target_scale.load(Ordering::SeqCst));
        let alpha = alpha::progress_alpha(current_scale, target_scale, &mut last);
        self.shared.last_target_scale.store(last.to_bits(), Ordering::SeqCst);
        alpha
    }

    pub(crate) fn guide_bottom(&self) -> i32 {
        self.shared.guide_bottom()
    }

    /// Block until the worker handled every message posted so far.
    ///
    /// Returns `false` on timeout, when the worker is gone, or when called
    /// from the worker itself.
    pub(crate) fn wait_idle(&self, timeout: Duration) -> bool {
        if self.on_worker_thread() {
            return false;
        }
        let (ack_tx, ack_rx) = mpsc::sync_channel(1);
        if self.tx.send(PanelMessage::Barrier(ack_tx)).is_err() {
            return false;
        }
        ack_rx.recv_timeout(timeout).is_ok()
    }

    /// Stop the worker, which removes any installed surfaces on its way out.
    pub(crate) fn shutdown(&self) {
        let Some(handle) = self.worker.lock().take() else {
            return;
        };
        if handle.thread().id() == thread::current().id() {
            // Last controller reference dropped by the worker; its queue
            // disconnects once the handle is gone.
            let _ = self.tx.try_send(PanelMessage::Shutdown);
            return;
        }
        if self.tx.send(PanelMessage::Shutdown).is_err() {
            debug!("surface worker already stopped");
        }
        if handle.join().is_err() {
            warn!("{WORKER_NAME} worker panicked");
        }
    }
}
