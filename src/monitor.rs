//! Structured records of discrete user actions.
//!
//! Fire-and-forget: nothing here can fail the caller. Records go to the `log`
//! facade under the `shrinkview::ops` target and, when configured, to an
//! external [`OperationSink`].

use std::fmt;
use std::sync::Arc;

use log::{info, warn};

use crate::error::ViewportError;
use crate::host::{ForegroundContext, ForegroundProbe};

const TARGET: &str = "shrinkview::ops";

/// A user action worth recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Entered via a trigger.
    Enter,
    /// Exited by touching outside the shrunk viewport.
    ExitOutside,
    /// Exited via the home trigger.
    ExitHome,
    /// Moved vertically with the drag handle.
    Move,
    /// Resized with the resize handle.
    Resize,
    /// Flipped to the left edge.
    SwipeLeft,
    /// Flipped to the right edge.
    SwipeRight,
}

impl Operation {
    /// Stable action name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enter => "enter",
            Self::ExitOutside => "exit_outside",
            Self::ExitHome => "exit_home",
            Self::Move => "move",
            Self::Resize => "resize",
            Self::SwipeLeft => "swipe_left",
            Self::SwipeRight => "swipe_right",
        }
    }

    /// Whether the foreground context is recorded with this action.
    fn wants_context(self) -> bool {
        matches!(self, Self::Enter | Self::ExitOutside | Self::ExitHome)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationEvent {
    /// What happened.
    pub operation: Operation,
    /// Foreground at the time, for enter/exit actions.
    pub context: Option<ForegroundContext>,
}

/// External telemetry boundary.
pub trait OperationSink: Send + Sync {
    /// Deliver one record.
    fn record(&self, event: &OperationEvent) -> Result<(), ViewportError>;
}

/// Records user actions tagged with the foreground context.
pub struct OperationMonitor {
    foreground: Arc<dyn ForegroundProbe>,
    sink: Option<Arc<dyn OperationSink>>,
}

impl fmt::Debug for OperationMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationMonitor")
            .field("sink", &self.sink.is_some())
            .finish_non_exhaustive()
    }
}

impl OperationMonitor {
    /// Create a monitor.
    pub fn new(foreground: Arc<dyn ForegroundProbe>, sink: Option<Arc<dyn OperationSink>>) -> Self {
        Self { foreground, sink }
    }

    /// Record `operation`.
    pub fn push(&self, operation: Operation) {
        let context = operation.wants_context().then(|| self.foreground.foreground());

        match &context {
            Some(ctx) => info!(target: TARGET, "action={operation} context={ctx}"),
            None => info!(target: TARGET, "action={operation}"),
        }

        if let Some(sink) = &self.sink {
            let event = OperationEvent { operation, context };
            if let Err(e) = sink.record(&event) {
                warn!(target: TARGET, "telemetry sink rejected {operation}: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct Keyguard;

    impl ForegroundProbe for Keyguard {
        fn foreground(&self) -> ForegroundContext {
            ForegroundContext::Keyguard
        }
    }

    #[derive(Default)]
    struct Collect {
        events: Mutex<Vec<OperationEvent>>,
    }

    impl OperationSink for Collect {
        fn record(&self, event: &OperationEvent) -> Result<(), ViewportError> {
            self.events.lock().push(event.clone());
            Ok(())
        }
    }

    struct Broken;

    impl OperationSink for Broken {
        fn record(&self, _: &OperationEvent) -> Result<(), ViewportError> {
            Err(ViewportError::Telemetry("offline".into()))
        }
    }

    #[test]
    fn context_only_for_enter_and_exit() {
        let sink = Arc::new(Collect::default());
        let monitor = OperationMonitor::new(Arc::new(Keyguard), Some(sink.clone()));

        monitor.push(Operation::Enter);
        monitor.push(Operation::Move);

        let events = sink.events.lock();
        assert_eq!(events[0].context, Some(ForegroundContext::Keyguard));
        assert_eq!(events[1].operation, Operation::Move);
        assert_eq!(events[1].context, None);
    }

    #[test]
    fn sink_failure_is_swallowed() {
        let monitor = OperationMonitor::new(Arc::new(Keyguard), Some(Arc::new(Broken)));
        monitor.push(Operation::ExitOutside);
        monitor.push(Operation::SwipeLeft);
    }
}
