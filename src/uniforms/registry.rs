//! Per-shader-slot uniform registry.
//!
//! The registry maps uniform names to their descriptor (current value plus
//! settings). It is rebuilt wholesale every time a slot's source text is
//! (re)loaded; nothing is diffed incrementally.

use std::collections::HashMap;
use std::fmt;

use super::value::{GlslType, UniformValue};

/// Callback a custom uniform can register to produce its value each tick.
pub type UniformCallback = Box<dyn FnMut() -> UniformValue>;

/// Tuning metadata for one uniform.
///
/// `pending` is a one-shot override: the synchronizer applies it on the next
/// tick and consumes it, so a value can be scheduled "for next frame"
/// without fighting the per-tick feeds.
pub struct UniformSettings {
    pub default: UniformValue,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub step: Option<f64>,
    pub callback: Option<UniformCallback>,
    pub pending: Option<UniformValue>,
}

impl UniformSettings {
    pub fn new(default: UniformValue) -> Self {
        Self {
            default,
            min: None,
            max: None,
            step: None,
            callback: None,
            pending: None,
        }
    }

    pub fn with_range(default: UniformValue, min: f64, max: f64, step: f64) -> Self {
        Self {
            default,
            min: Some(min),
            max: Some(max),
            step: Some(step),
            callback: None,
            pending: None,
        }
    }

    /// Merge a partial update into these settings; only present fields
    /// overwrite.
    pub fn merge(&mut self, patch: SettingsPatch) {
        if let Some(default) = patch.default {
            self.default = default;
        }
        if let Some(min) = patch.min {
            self.min = Some(min);
        }
        if let Some(max) = patch.max {
            self.max = Some(max);
        }
        if let Some(step) = patch.step {
            self.step = Some(step);
        }
        if let Some(callback) = patch.callback {
            self.callback = Some(callback);
        }
        if let Some(value) = patch.value {
            self.pending = Some(value);
        }
    }
}

impl fmt::Debug for UniformSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UniformSettings")
            .field("default", &self.default)
            .field("min", &self.min)
            .field("max", &self.max)
            .field("step", &self.step)
            .field("callback", &self.callback.is_some())
            .field("pending", &self.pending)
            .finish()
    }
}

/// Partial settings update; `value` schedules a one-shot override.
#[derive(Default)]
pub struct SettingsPatch {
    pub default: Option<UniformValue>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub step: Option<f64>,
    pub callback: Option<UniformCallback>,
    pub value: Option<UniformValue>,
}

/// One discovered uniform: resolved type, array size, live value, settings.
#[derive(Debug)]
pub struct UniformDescriptor {
    pub glsl_type: GlslType,
    pub array_size: usize,
    pub value: UniformValue,
    pub settings: UniformSettings,
}

impl UniformDescriptor {
    pub fn new(glsl_type: GlslType, array_size: usize, value: UniformValue, settings: UniformSettings) -> Self {
        Self {
            glsl_type,
            array_size,
            value,
            settings,
        }
    }

    /// Descriptor whose value and settings both come from the same default.
    pub fn from_default(value: UniformValue) -> Self {
        Self {
            glsl_type: value.glsl_type(),
            array_size: value.array_len(),
            settings: UniformSettings::new(value.clone()),
            value,
        }
    }
}

/// Name → descriptor map for one shader slot.
#[derive(Debug, Default)]
pub struct UniformRegistry {
    entries: HashMap<String, UniformDescriptor>,
}

impl UniformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, descriptor: UniformDescriptor) {
        self.entries.insert(name.into(), descriptor);
    }

    pub fn get(&self, name: &str) -> Option<&UniformDescriptor> {
        self.entries.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut UniformDescriptor> {
        self.entries.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Merge a settings patch per name; unknown names create a fresh
    /// descriptor so callers can pre-register settings for uniforms a later
    /// shader will declare.
    pub fn update_settings(&mut self, patches: HashMap<String, SettingsPatch>) {
        for (name, patch) in patches {
            match self.entries.get_mut(&name) {
                Some(desc) => desc.settings.merge(patch),
                None => {
                    let default = patch
                        .default
                        .clone()
                        .unwrap_or(UniformValue::Float(0.0));
                    let mut desc = UniformDescriptor::from_default(default);
                    desc.settings.merge(patch);
                    self.entries.insert(name, desc);
                }
            }
        }
    }
}
