//! Persisted settings: a key/value store trait and a typed adapter.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use log::warn;
use parking_lot::Mutex;

use crate::config::UserId;
use crate::error::ViewportError;
use crate::mode::Anchor;

const KEY_FEATURE_ENABLED: &str = "shrinkview.enabled";
const KEY_ANCHOR: &str = "shrinkview.anchor";
const KEY_X_OFFSET: &str = "shrinkview.x_offset";
const KEY_Y_OFFSET: &str = "shrinkview.y_offset";
const KEY_SCALE: &str = "shrinkview.scale";

/// A value held by a [`SettingsStore`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SettingValue {
    /// Integer value.
    Int(i32),
    /// Floating-point value.
    Float(f32),
}

/// Durable per-user key/value storage provided by the host.
pub trait SettingsStore: Send + Sync {
    /// Read a value, `None` if it was never written.
    fn get(&self, user: UserId, key: &str) -> Option<SettingValue>;

    /// Write a value.
    fn put(&self, user: UserId, key: &str, value: SettingValue) -> Result<(), ViewportError>;
}

/// In-memory [`SettingsStore`], for tests and hosts without persistence.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    values: Mutex<HashMap<(UserId, String), SettingValue>>,
}

impl MemorySettingsStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get(&self, user: UserId, key: &str) -> Option<SettingValue> {
        self.values.lock().get(&(user, key.to_string())).copied()
    }

    fn put(&self, user: UserId, key: &str, value: SettingValue) -> Result<(), ViewportError> {
        self.values.lock().insert((user, key.to_string()), value);
        Ok(())
    }
}

/// Typed view of the persisted fields for the current user.
///
/// Shared by the controller and the control-surface worker; the current user
/// is switched in place when the session changes.
pub struct Settings {
    store: Arc<dyn SettingsStore>,
    user: AtomicU32,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("user", &self.user())
            .finish_non_exhaustive()
    }
}

impl Settings {
    /// Adapter over `store` for `user`.
    pub fn new(store: Arc<dyn SettingsStore>, user: UserId) -> Self {
        Self {
            store,
            user: AtomicU32::new(user),
        }
    }

    /// The user whose settings are read and written.
    pub fn user(&self) -> UserId {
        self.user.load(Ordering::SeqCst)
    }

    /// Switch to another user's settings.
    pub fn set_user(&self, user: UserId) {
        self.user.store(user, Ordering::SeqCst);
    }

    fn get_int(&self, user: UserId, key: &str) -> Option<i32> {
        match self.store.get(user, key)? {
            SettingValue::Int(v) => Some(v),
            SettingValue::Float(v) => Some(v as i32),
        }
    }

    fn get_float(&self, key: &str) -> Option<f32> {
        match self.store.get(self.user(), key)? {
            SettingValue::Float(v) => Some(v),
            SettingValue::Int(v) => Some(v as f32),
        }
    }

    fn put(&self, user: UserId, key: &str, value: SettingValue) {
        if let Err(e) = self.store.put(user, key, value) {
            warn!("failed to persist {key} for user {user}: {e}");
        }
    }

    /// Whether the feature is enabled for the current user (off when unset).
    pub fn is_feature_enabled(&self) -> bool {
        self.get_int(self.user(), KEY_FEATURE_ENABLED).unwrap_or(0) != 0
    }

    /// Enable or disable the feature for `user`.
    pub fn set_feature_enabled(&self, user: UserId, enabled: bool) {
        self.put(user, KEY_FEATURE_ENABLED, SettingValue::Int(i32::from(enabled)));
    }

    /// Whether the feature flag was never written for `user`.
    pub fn is_feature_setting_missing(&self, user: UserId) -> bool {
        self.store.get(user, KEY_FEATURE_ENABLED).is_none()
    }

    /// Last anchor, or `default` when unset or unreadable.
    pub fn anchor(&self, default: Anchor) -> Anchor {
        match self.get_int(self.user(), KEY_ANCHOR) {
            Some(bits) => Anchor::from_bits(bits as u32).unwrap_or_else(|e| {
                warn!("ignoring persisted anchor: {e}");
                default
            }),
            None => default,
        }
    }

    /// Persist the anchor.
    pub fn save_anchor(&self, anchor: Anchor) {
        self.put(self.user(), KEY_ANCHOR, SettingValue::Int(anchor.to_bits() as i32));
    }

    /// Last horizontal offset, `0` when unset.
    pub fn x_offset(&self) -> i32 {
        self.get_int(self.user(), KEY_X_OFFSET).unwrap_or(0)
    }

    /// Persist the horizontal offset.
    pub fn save_x_offset(&self, x: i32) {
        self.put(self.user(), KEY_X_OFFSET, SettingValue::Int(x));
    }

    /// Last vertical offset, `0` when unset.
    pub fn y_offset(&self) -> i32 {
        self.get_int(self.user(), KEY_Y_OFFSET).unwrap_or(0)
    }

    /// Persist the vertical offset.
    pub fn save_y_offset(&self, y: i32) {
        self.put(self.user(), KEY_Y_OFFSET, SettingValue::Int(y));
    }

    /// Last scale, or `default` when unset or not a usable scale.
    pub fn scale(&self, default: f32) -> f32 {
        match self.get_float(KEY_SCALE) {
            Some(s) if s.is_finite() && s > 0.0 => s,
            _ => default,
        }
    }

    /// Persist the scale.
    pub fn save_scale(&self, scale: f32) {
        self.put(self.user(), KEY_SCALE, SettingValue::Float(scale));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::{Horizontal, Vertical};

    fn settings() -> (Arc<MemorySettingsStore>, Settings) {
        let store = Arc::new(MemorySettingsStore::new());
        let settings = Settings::new(store.clone(), 0);
        (store, settings)
    }

    #[test]
    fn defaults_when_nothing_persisted() {
        let (_, s) = settings();
        assert!(!s.is_feature_enabled());
        assert!(s.is_feature_setting_missing(0));
        assert_eq!(s.x_offset(), 0);
        assert_eq!(s.y_offset(), 0);
        assert_eq!(s.scale(0.75), 0.75);
        assert_eq!(s.anchor(Anchor::TOP_LEFT), Anchor::TOP_LEFT);
    }

    #[test]
    fn values_are_per_user() {
        let (_, s) = settings();
        s.save_x_offset(8);
        s.save_y_offset(120);
        s.save_scale(0.7);
        s.save_anchor(Anchor::new(Horizontal::Right, Vertical::Bottom));

        s.set_user(10);
        assert_eq!(s.y_offset(), 0);
        assert_eq!(s.scale(0.75), 0.75);

        s.set_user(0);
        assert_eq!(s.x_offset(), 8);
        assert_eq!(s.y_offset(), 120);
        assert_eq!(s.scale(0.75), 0.7);
        assert_eq!(
            s.anchor(Anchor::TOP_LEFT),
            Anchor::new(Horizontal::Right, Vertical::Bottom)
        );
    }

    #[test]
    fn corrupt_values_fall_back() {
        let (store, s) = settings();
        store.put(0, KEY_ANCHOR, SettingValue::Int(0xff)).unwrap();
        store.put(0, KEY_SCALE, SettingValue::Float(-1.0)).unwrap();
        assert_eq!(s.anchor(Anchor::TOP_LEFT), Anchor::TOP_LEFT);
        assert_eq!(s.scale(0.75), 0.75);
    }

    #[test]
    fn feature_flag_written_for_explicit_user() {
        let (_, s) = settings();
        s.set_feature_enabled(7, true);
        assert!(!s.is_feature_enabled());
        assert!(!s.is_feature_setting_missing(7));
        s.set_user(7);
        assert!(s.is_feature_enabled());
    }
}
