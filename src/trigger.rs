//! Recognises the horizontal fling that asks for a shrunk viewport.
//!
//! Feed raw touch samples from the navigation area to
//! [`SwipeTrigger::handle`]; a recognised fling yields the side to dock to,
//! which becomes an [`EnvironmentEvent::Trigger`].

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use log::{debug, trace};

use crate::events::EnvironmentEvent;
use crate::host::DisplayInfo;
use crate::mode::Horizontal;
use crate::panel::TouchPhase;

/// Samples older than this do not contribute to the release velocity.
const VELOCITY_WINDOW: Duration = Duration::from_millis(100);

/// Thresholds of the fling recogniser, in pixels and pixels per second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwipeConfig {
    /// Minimum horizontal release velocity.
    pub min_fling_velocity: f32,
    /// Velocities above this are clamped.
    pub max_fling_velocity: f32,
    /// Minimum horizontal travel.
    pub horizontal_threshold: f32,
    /// Maximum vertical travel.
    pub vertical_limit: f32,
}

impl Default for SwipeConfig {
    fn default() -> Self {
        Self {
            min_fling_velocity: 150.0,
            max_fling_velocity: 24_000.0,
            horizontal_threshold: 120.0,
            vertical_limit: 60.0,
        }
    }
}

/// One raw touch sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchSample {
    /// Phase of the primary pointer.
    pub phase: TouchPhase,
    /// Screen x.
    pub x: f32,
    /// Screen y.
    pub y: f32,
    /// When the sample was taken.
    pub time: Instant,
}

/// Horizontal fling recogniser.
#[derive(Debug, Clone)]
pub struct SwipeTrigger {
    config: SwipeConfig,
    down: Option<(f32, f32)>,
    recent: VecDeque<(f32, f32, Instant)>,
}

impl SwipeTrigger {
    /// Create a recogniser.
    pub fn new(config: SwipeConfig) -> Self {
        Self {
            config,
            down: None,
            recent: VecDeque::new(),
        }
    }

    /// Feed one sample. Returns the side to dock to when the sample completes
    /// a fling on a portrait display.
    ///
    /// A right-to-left fling docks left, a left-to-right one docks right.
    pub fn handle(&mut self, sample: TouchSample, display: DisplayInfo) -> Option<Horizontal> {
        match sample.phase {
            TouchPhase::Down => {
                self.down = Some((sample.x, sample.y));
                self.recent.clear();
                self.track(sample);
                None
            }
            TouchPhase::Move => {
                if self.down.is_some() {
                    self.track(sample);
                }
                None
            }
            TouchPhase::Cancel => {
                self.reset();
                None
            }
            TouchPhase::Up => {
                let Some(down) = self.down else {
                    return None;
                };
                self.track(sample);
                let side = self.recognise(down, display);
                self.reset();
                side
            }
        }
    }

    /// Like [`SwipeTrigger::handle`], wrapped as the event the controller
    /// consumes.
    pub fn handle_event(&mut self, sample: TouchSample, display: DisplayInfo) -> Option<EnvironmentEvent> {
        self.handle(sample, display)
            .map(|side| EnvironmentEvent::Trigger {
                alignment: Some(side),
                vertical_position: None,
            })
    }

    fn reset(&mut self) {
        self.down = None;
        self.recent.clear();
    }

    fn track(&mut self, sample: TouchSample) {
        self.recent.push_back((sample.x, sample.y, sample.time));
        while let Some(&(_, _, t)) = self.recent.front() {
            if sample.time.saturating_duration_since(t) <= VELOCITY_WINDOW {
                break;
            }
            self.recent.pop_front();
        }
    }

    fn velocity_x(&self) -> f32 {
        let (Some(&(x0, _, t0)), Some(&(x1, _, t1))) = (self.recent.front(), self.recent.back()) else {
            return 0.0;
        };
        let dt = t1.saturating_duration_since(t0).as_secs_f32();
        if dt <= 0.0 {
            return 0.0;
        }
        let max = self.config.max_fling_velocity;
        ((x1 - x0) / dt).clamp(-max, max)
    }

    fn recognise(&self, down: (f32, f32), display: DisplayInfo) -> Option<Horizontal> {
        let velocity = self.velocity_x();
        if velocity.abs() <= self.config.min_fling_velocity {
            trace!("swipe too slow: {velocity}");
            return None;
        }

        let mut distance_x = 0.0;
        for &(x, y, _) in &self.recent {
            let dx = down.0 - x;
            let dy = down.1 - y;
            if dy.abs() > dx.abs() || dy.abs() > self.config.vertical_limit {
                debug!("swipe rejected, vertical travel {dy} against {dx}");
                return None;
            }
            distance_x = dx;
        }

        if distance_x.abs() <= self.config.horizontal_threshold {
            debug!("swipe too short: {distance_x}");
            return None;
        }
        if display.is_landscape() {
            return None;
        }

        Some(if distance_x > 0.0 {
            Horizontal::Left
        } else {
            Horizontal::Right
        })
    }
}

impl Default for SwipeTrigger {
    fn default() -> Self {
        Self::new(SwipeConfig::default())
    }
}
