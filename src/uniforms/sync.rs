//! Per-frame uniform synchronization.
//!
//! One synchronizer drives both update shapes: the per-mesh path walks each
//! slot and applies its own mesh-kind aspect rule, while the batched path
//! computes every name once and fans it out to all materials that declare
//! it, using the first mesh's kind for the aspect correction. All clock and
//! event state comes in through explicit context structs so the update is
//! testable without a helper instance.

use glam::{Vec2, Vec4};

use super::catalog::DateStamp;
use super::registry::UniformRegistry;
use super::resample::downsample;
use super::value::UniformValue;
use crate::geometry::MeshKind;
use crate::material::{ShaderMaterial, ShaderProgramRecord};
use crate::shader_constants::{COARSE_REFRESH_MS, SPECTRUM_LEN};
use crate::texture::TextureData;

/// Millisecond clock bases shared by every slot.
///
/// `last_time_ms` and `last_frame_ms` advance only when the elapsed gap
/// exceeds [`COARSE_REFRESH_MS`], so iTimeDelta/iFrameRate measure against a
/// coarse-grained base rather than the previous tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncClock {
    pub start_ms: f64,
    pub last_time_ms: f64,
    pub last_frame_ms: f64,
}

impl SyncClock {
    pub fn new(now_ms: f64) -> Self {
        Self {
            start_ms: now_ms,
            last_time_ms: now_ms,
            last_frame_ms: now_ms,
        }
    }

    /// Re-zero all bases, e.g. when a new shader is swapped in.
    pub fn restart(&mut self, now_ms: f64) {
        *self = Self::new(now_ms);
    }
}

/// Latest pointer snapshot; events overwrite, the synchronizer reads once
/// per tick. `clicked` stays set after the first mouse-down.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MouseState {
    /// (moveX, moveY, downX, downY)
    pub xyzw: [f32; 4],
    pub clicked: bool,
}

impl MouseState {
    pub fn on_move(&mut self, x: f32, y: f32) {
        self.xyzw[0] = x;
        self.xyzw[1] = y;
    }

    pub fn on_down(&mut self, x: f32, y: f32) {
        self.clicked = true;
        self.xyzw[2] = x;
        self.xyzw[3] = y;
    }
}

/// Everything one tick needs from the outside world.
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    pub now_ms: f64,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub mouse: MouseState,
    pub date: DateStamp,
    /// Fresh canvas capture for `iImage`, taken this tick.
    pub capture: Option<TextureData>,
    /// Live analyzer frequency bins; present only while audio is playing.
    pub audio_bins: Option<Vec<u8>>,
}

impl FrameInput {
    pub fn at(now_ms: f64, canvas_width: u32, canvas_height: u32) -> Self {
        Self {
            now_ms,
            canvas_width,
            canvas_height,
            ..Default::default()
        }
    }
}

/// Which mesh's aspect rule applies when several slots share a uniform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AspectMode {
    /// Each slot resolves `iResolution` with its own mesh kind.
    PerMesh,
    /// One pass per name; `iResolution` uses the first slot's mesh kind for
    /// every material.
    SharedFirstMesh,
}

/// `iResolution` replacement value for a mesh kind.
///
/// Spheres and VR screens stretch their UV space, so they get
/// (max(w,h), w) instead of the raw canvas size; half-spheres, circles, and
/// planes keep the raw size.
pub fn resolution_for(kind: MeshKind, width: u32, height: u32) -> Vec2 {
    let w = width as f32;
    let h = height as f32;
    match kind {
        MeshKind::Halfsphere | MeshKind::Circle => Vec2::new(w, h),
        MeshKind::Plane => Vec2::new(w, h),
        _ => Vec2::new(w.max(h), w),
    }
}

/// Synchronize every slot for this tick.
///
/// `materials`, `records`, and `views` are parallel-indexed; all three must
/// be the same length.
pub fn sync_slots(
    materials: &mut [ShaderMaterial],
    records: &[ShaderProgramRecord],
    views: &[MeshKind],
    mode: AspectMode,
    registry: &mut UniformRegistry,
    clock: &mut SyncClock,
    frame: &FrameInput,
) {
    debug_assert_eq!(materials.len(), records.len());
    debug_assert_eq!(materials.len(), views.len());

    match mode {
        AspectMode::PerMesh => {
            for (i, material) in materials.iter_mut().enumerate() {
                sync_material(
                    material,
                    &records[i].ordered_uniform_names,
                    views[i],
                    registry,
                    clock,
                    frame,
                );
            }
        }
        AspectMode::SharedFirstMesh => {
            sync_batched(materials, records, views, registry, clock, frame);
        }
    }
}

/// Update one material's uniform values in place.
///
/// Rules are checked in fixed priority order; the first matching rule
/// applies. Names without a special case fall through to the custom path:
/// callback if registered, else a pending one-shot override, else left
/// unchanged.
pub fn sync_material(
    material: &mut ShaderMaterial,
    ordered_names: &[String],
    mesh_kind: MeshKind,
    registry: &mut UniformRegistry,
    clock: &mut SyncClock,
    frame: &FrameInput,
) {
    let now = frame.now_ms;

    for name in ordered_names {
        if !material.uniforms.contains_key(name) {
            material.uniforms.insert(name.clone(), UniformValue::Float(0.0));
        }

        match name.as_str() {
            "iResolution" => {
                let target = resolution_for(mesh_kind, frame.canvas_width, frame.canvas_height);
                if material.uniforms.get(name) != Some(&UniformValue::Vec2(target)) {
                    material.uniforms.insert(name.clone(), UniformValue::Vec2(target));
                }
            }
            "iTime" => {
                let t = ((now - clock.start_ms) * 0.001) as f32;
                material.uniforms.insert(name.clone(), UniformValue::Float(t));
            }
            "iTimeDelta" => {
                let gap = now - clock.last_time_ms;
                material
                    .uniforms
                    .insert(name.clone(), UniformValue::Float((gap * 0.001) as f32));
                if gap > COARSE_REFRESH_MS {
                    clock.last_time_ms = now;
                }
            }
            "iFrame" => {
                let next = match material.uniforms.get(name) {
                    Some(UniformValue::Int(v)) => v + 1,
                    _ => 1,
                };
                material.uniforms.insert(name.clone(), UniformValue::Int(next));
            }
            "iFrameRate" => {
                let gap = now - clock.last_frame_ms;
                material
                    .uniforms
                    .insert(name.clone(), UniformValue::Float((1.0 / (gap * 0.001)) as f32));
                if gap > COARSE_REFRESH_MS {
                    clock.last_frame_ms = now;
                }
            }
            "iChannelTime" => {
                let t = ((now - clock.start_ms) * 0.001) as f32;
                let len = match material.uniforms.get(name) {
                    Some(UniformValue::FloatArray(v)) if !v.is_empty() => v.len(),
                    _ => 4,
                };
                material
                    .uniforms
                    .insert(name.clone(), UniformValue::FloatArray(vec![t; len]));
            }
            "iDate" => {
                material
                    .uniforms
                    .insert(name.clone(), UniformValue::Vec4(frame.date.to_vec4()));
            }
            "iMouse" => {
                material
                    .uniforms
                    .insert(name.clone(), UniformValue::Vec4(Vec4::from_array(frame.mouse.xyzw)));
            }
            "iMouseInput" => {
                let flag = if frame.mouse.clicked { 1.0 } else { 0.0 };
                material.uniforms.insert(name.clone(), UniformValue::Float(flag));
            }
            "iImage" => {
                // recreated from the live canvas every tick; expensive on
                // purpose
                let capture = frame
                    .capture
                    .clone()
                    .unwrap_or_else(|| TextureData::blank(frame.canvas_width, frame.canvas_height));
                material.uniforms.insert(name.clone(), UniformValue::Texture(capture));
            }
            "iAudio" => {
                if let Some(value) = audio_spectrum(registry, frame) {
                    material.uniforms.insert(name.clone(), value);
                }
            }
            _ => {
                if let Some(value) = custom_value(registry, name) {
                    material.uniforms.insert(name.clone(), value);
                }
            }
        }
    }
}

/// Batched pass: compute each registered name once, then fan the value out
/// to every material whose record declares it. `iResolution` uses the first
/// view's mesh kind for all targets.
fn sync_batched(
    materials: &mut [ShaderMaterial],
    records: &[ShaderProgramRecord],
    views: &[MeshKind],
    registry: &mut UniformRegistry,
    clock: &mut SyncClock,
    frame: &FrameInput,
) {
    let first_kind = views.first().copied().unwrap_or(MeshKind::Plane);
    let now = frame.now_ms;
    let names: Vec<String> = registry.names().map(str::to_string).collect();

    for name in names {
        let targets: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.ordered_uniform_names.iter().any(|n| n == &name))
            .map(|(i, _)| i)
            .collect();
        if targets.is_empty() {
            continue;
        }

        let value = match name.as_str() {
            "iResolution" => {
                let target = resolution_for(first_kind, frame.canvas_width, frame.canvas_height);
                let value = UniformValue::Vec2(target);
                if let Some(desc) = registry.get_mut(&name) {
                    desc.value = value.clone();
                }
                Some(value)
            }
            "iTime" => Some(UniformValue::Float(((now - clock.start_ms) * 0.001) as f32)),
            "iTimeDelta" => {
                let gap = now - clock.last_time_ms;
                if gap > COARSE_REFRESH_MS {
                    clock.last_time_ms = now;
                }
                Some(UniformValue::Float((gap * 0.001) as f32))
            }
            "iFrame" => {
                let next = match registry.get(&name).map(|d| &d.value) {
                    Some(UniformValue::Int(v)) => v + 1,
                    _ => 1,
                };
                if let Some(desc) = registry.get_mut(&name) {
                    desc.value = UniformValue::Int(next);
                }
                Some(UniformValue::Int(next))
            }
            "iFrameRate" => {
                let gap = now - clock.last_frame_ms;
                if gap > COARSE_REFRESH_MS {
                    clock.last_frame_ms = now;
                }
                Some(UniformValue::Float((1.0 / (gap * 0.001)) as f32))
            }
            "iChannelTime" => {
                let t = ((now - clock.start_ms) * 0.001) as f32;
                let len = match registry.get(&name).map(|d| &d.value) {
                    Some(UniformValue::FloatArray(v)) if !v.is_empty() => v.len(),
                    _ => 4,
                };
                Some(UniformValue::FloatArray(vec![t; len]))
            }
            "iDate" => Some(UniformValue::Vec4(frame.date.to_vec4())),
            "iMouse" => Some(UniformValue::Vec4(Vec4::from_array(frame.mouse.xyzw))),
            "iMouseInput" => Some(UniformValue::Float(if frame.mouse.clicked { 1.0 } else { 0.0 })),
            "iImage" => Some(UniformValue::Texture(frame.capture.clone().unwrap_or_else(
                || TextureData::blank(frame.canvas_width, frame.canvas_height),
            ))),
            "iAudio" => audio_spectrum(registry, frame),
            _ => custom_value(registry, &name),
        };

        if let Some(value) = value {
            for &i in &targets {
                materials[i].uniforms.insert(name.clone(), value.clone());
            }
        }
    }
}

/// Live spectrum while audio plays, cached registry value otherwise.
fn audio_spectrum(registry: &mut UniformRegistry, frame: &FrameInput) -> Option<UniformValue> {
    match &frame.audio_bins {
        Some(bins) => {
            let floats: Vec<f32> = bins.iter().map(|&b| b as f32).collect();
            let value = UniformValue::FloatArray(downsample(&floats, SPECTRUM_LEN, 1.0));
            if let Some(desc) = registry.get_mut("iAudio") {
                desc.value = value.clone();
            }
            Some(value)
        }
        None => registry.get("iAudio").map(|desc| desc.value.clone()),
    }
}

/// Custom uniform path: callback wins, then a pending one-shot override
/// (consumed here), otherwise nothing.
fn custom_value(registry: &mut UniformRegistry, name: &str) -> Option<UniformValue> {
    let desc = registry.get_mut(name)?;
    if let Some(callback) = desc.settings.callback.as_mut() {
        let value = callback();
        desc.value = value.clone();
        return Some(value);
    }
    if let Some(value) = desc.settings.pending.take() {
        desc.value = value.clone();
        return Some(value);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uniforms::catalog::CatalogContext;
    use crate::uniforms::parser::parse_uniforms;
    use crate::uniforms::registry::{SettingsPatch, UniformDescriptor};
    use std::collections::HashMap;

    const W: u32 = 800;
    const H: u32 = 600;

    fn setup(fragment: &str) -> (ShaderMaterial, Vec<String>, UniformRegistry) {
        let parsed = parse_uniforms(fragment, &CatalogContext::new(W, H));
        let material = ShaderMaterial::from_registry("v", fragment, &parsed.ordered_names, &parsed.registry);
        (material, parsed.ordered_names, parsed.registry)
    }

    fn frame(now_ms: f64) -> FrameInput {
        FrameInput::at(now_ms, W, H)
    }

    #[test]
    fn test_time_advances_but_delta_base_stays_within_coarse_window() {
        let (mut material, names, mut registry) =
            setup("uniform float iTime;\nuniform float iTimeDelta;");
        let mut clock = SyncClock::new(0.0);

        sync_material(&mut material, &names, MeshKind::Plane, &mut registry, &mut clock, &frame(0.0));
        sync_material(&mut material, &names, MeshKind::Plane, &mut registry, &mut clock, &frame(2.0));

        // 2 ms gap: iTime moved, the delta base did not
        assert_eq!(material.value("iTime"), Some(&UniformValue::Float(0.002)));
        assert_eq!(clock.last_time_ms, 0.0);
        assert_eq!(material.value("iTimeDelta"), Some(&UniformValue::Float(0.002)));

        sync_material(&mut material, &names, MeshKind::Plane, &mut registry, &mut clock, &frame(10.0));
        assert_eq!(clock.last_time_ms, 10.0);
    }

    #[test]
    fn test_sphere_resolution_uses_max_then_width() {
        let (mut material, names, mut registry) = setup("uniform vec2 iResolution;");
        let mut clock = SyncClock::new(0.0);

        sync_material(&mut material, &names, MeshKind::Sphere, &mut registry, &mut clock, &frame(0.0));
        assert_eq!(
            material.value("iResolution"),
            Some(&UniformValue::Vec2(Vec2::new(800.0, 800.0)))
        );

        sync_material(&mut material, &names, MeshKind::Plane, &mut registry, &mut clock, &frame(1.0));
        assert_eq!(
            material.value("iResolution"),
            Some(&UniformValue::Vec2(Vec2::new(800.0, 600.0)))
        );
    }

    #[test]
    fn test_halfsphere_and_circle_keep_raw_resolution() {
        for kind in [MeshKind::Halfsphere, MeshKind::Circle] {
            let (mut material, names, mut registry) = setup("uniform vec2 iResolution;");
            let mut clock = SyncClock::new(0.0);
            sync_material(&mut material, &names, kind, &mut registry, &mut clock, &frame(0.0));
            assert_eq!(
                material.value("iResolution"),
                Some(&UniformValue::Vec2(Vec2::new(800.0, 600.0)))
            );
        }
    }

    #[test]
    fn test_frame_counter_increments_per_tick() {
        let (mut material, names, mut registry) = setup("uniform int iFrame;");
        let mut clock = SyncClock::new(0.0);
        for _ in 0..3 {
            sync_material(&mut material, &names, MeshKind::Plane, &mut registry, &mut clock, &frame(0.0));
        }
        assert_eq!(material.value("iFrame"), Some(&UniformValue::Int(3)));
    }

    #[test]
    fn test_mouse_snapshot_and_sticky_click() {
        let (mut material, names, mut registry) =
            setup("uniform vec4 iMouse;\nuniform float iMouseInput;");
        let mut clock = SyncClock::new(0.0);

        let mut f = frame(0.0);
        f.mouse.on_move(12.0, 34.0);
        f.mouse.on_down(56.0, 78.0);
        sync_material(&mut material, &names, MeshKind::Plane, &mut registry, &mut clock, &f);

        assert_eq!(
            material.value("iMouse"),
            Some(&UniformValue::Vec4(Vec4::new(12.0, 34.0, 56.0, 78.0)))
        );
        assert_eq!(material.value("iMouseInput"), Some(&UniformValue::Float(1.0)));
    }

    #[test]
    fn test_channel_time_fills_all_slots() {
        let (mut material, names, mut registry) = setup("uniform float iChannelTime[4];");
        let mut clock = SyncClock::new(0.0);
        sync_material(&mut material, &names, MeshKind::Plane, &mut registry, &mut clock, &frame(2000.0));
        assert_eq!(
            material.value("iChannelTime"),
            Some(&UniformValue::FloatArray(vec![2.0; 4]))
        );
    }

    #[test]
    fn test_audio_downsamples_live_bins_and_caches() {
        let (mut material, names, mut registry) = setup("uniform float iAudio[256];");
        let mut clock = SyncClock::new(0.0);

        let mut f = frame(0.0);
        f.audio_bins = Some(vec![100u8; 512]);
        sync_material(&mut material, &names, MeshKind::Plane, &mut registry, &mut clock, &f);

        // 512 raw bins reduce by binned averaging (one short of the target)
        let live = match material.value("iAudio") {
            Some(UniformValue::FloatArray(v)) => v.clone(),
            other => panic!("unexpected iAudio value {:?}", other),
        };
        assert_eq!(live.len(), SPECTRUM_LEN - 1);
        assert!(live.iter().all(|&v| v == 100.0));

        // silence: the cached value survives
        sync_material(&mut material, &names, MeshKind::Plane, &mut registry, &mut clock, &frame(16.0));
        assert_eq!(material.value("iAudio"), Some(&UniformValue::FloatArray(live)));
    }

    #[test]
    fn test_audio_bins_at_target_length_pass_through() {
        let (mut material, names, mut registry) = setup("uniform float iAudio[256];");
        let mut clock = SyncClock::new(0.0);

        let mut f = frame(0.0);
        f.audio_bins = Some((0..=255).collect());
        sync_material(&mut material, &names, MeshKind::Plane, &mut registry, &mut clock, &f);

        match material.value("iAudio") {
            Some(UniformValue::FloatArray(v)) => {
                assert_eq!(v.len(), SPECTRUM_LEN);
                assert_eq!(v[255], 255.0);
            }
            other => panic!("unexpected iAudio value {:?}", other),
        }
    }

    #[test]
    fn test_custom_callback_feeds_value() {
        let (mut material, names, mut registry) = setup("uniform float uPulse;");
        let mut patches = HashMap::new();
        patches.insert(
            "uPulse".to_string(),
            SettingsPatch {
                callback: Some(Box::new(|| UniformValue::Float(0.7))),
                ..Default::default()
            },
        );
        registry.update_settings(patches);

        let mut clock = SyncClock::new(0.0);
        sync_material(&mut material, &names, MeshKind::Plane, &mut registry, &mut clock, &frame(0.0));
        assert_eq!(material.value("uPulse"), Some(&UniformValue::Float(0.7)));
    }

    #[test]
    fn test_pending_override_applies_exactly_once() {
        let (mut material, names, mut registry) = setup("uniform float uGain;");
        registry.get_mut("uGain").unwrap().settings.pending = Some(UniformValue::Float(9.0));

        let mut clock = SyncClock::new(0.0);
        sync_material(&mut material, &names, MeshKind::Plane, &mut registry, &mut clock, &frame(0.0));
        assert_eq!(material.value("uGain"), Some(&UniformValue::Float(9.0)));
        assert!(registry.get("uGain").unwrap().settings.pending.is_none());

        // later writes are not clobbered by a stale override
        material.set_value("uGain", UniformValue::Float(1.0));
        sync_material(&mut material, &names, MeshKind::Plane, &mut registry, &mut clock, &frame(1.0));
        assert_eq!(material.value("uGain"), Some(&UniformValue::Float(1.0)));
    }

    #[test]
    fn test_date_fields_written() {
        let (mut material, names, mut registry) = setup("uniform vec4 iDate;");
        let mut clock = SyncClock::new(0.0);
        let mut f = frame(0.0);
        f.date = DateStamp {
            year_offset: 126.0,
            month: 7.0,
            weekday: 3.0,
            seconds_since_midnight: 43200.0,
        };
        sync_material(&mut material, &names, MeshKind::Plane, &mut registry, &mut clock, &f);
        assert_eq!(
            material.value("iDate"),
            Some(&UniformValue::Vec4(Vec4::new(126.0, 7.0, 3.0, 43200.0)))
        );
    }

    #[test]
    fn test_batched_mode_shares_first_mesh_aspect() {
        let fragment = "uniform vec2 iResolution;";
        let parsed = parse_uniforms(fragment, &CatalogContext::new(W, H));
        let record = ShaderProgramRecord {
            ordered_uniform_names: parsed.ordered_names.clone(),
            ..Default::default()
        };
        let material = ShaderMaterial::from_registry("v", fragment, &parsed.ordered_names, &parsed.registry);

        let mut materials = vec![material.clone(), material];
        let records = vec![record.clone(), record];
        let views = vec![MeshKind::Sphere, MeshKind::Plane];
        let mut registry = parsed.registry;
        let mut clock = SyncClock::new(0.0);

        sync_slots(
            &mut materials,
            &records,
            &views,
            AspectMode::SharedFirstMesh,
            &mut registry,
            &mut clock,
            &frame(0.0),
        );

        // the plane slot inherits the sphere's aspect correction
        for material in &materials {
            assert_eq!(
                material.value("iResolution"),
                Some(&UniformValue::Vec2(Vec2::new(800.0, 800.0)))
            );
        }
    }

    #[test]
    fn test_batched_mode_counts_frames_once() {
        let fragment = "uniform int iFrame;";
        let parsed = parse_uniforms(fragment, &CatalogContext::new(W, H));
        let record = ShaderProgramRecord {
            ordered_uniform_names: parsed.ordered_names.clone(),
            ..Default::default()
        };
        let material = ShaderMaterial::from_registry("v", fragment, &parsed.ordered_names, &parsed.registry);

        let mut materials = vec![material.clone(), material];
        let records = vec![record.clone(), record];
        let views = vec![MeshKind::Plane, MeshKind::Plane];
        let mut registry = parsed.registry;
        let mut clock = SyncClock::new(0.0);

        for _ in 0..2 {
            sync_slots(
                &mut materials,
                &records,
                &views,
                AspectMode::SharedFirstMesh,
                &mut registry,
                &mut clock,
                &frame(0.0),
            );
        }

        // one shared increment per tick, fanned out to both materials
        for material in &materials {
            assert_eq!(material.value("iFrame"), Some(&UniformValue::Int(2)));
        }
    }

    #[test]
    fn test_missing_descriptor_is_tolerated() {
        // unknown declared type: the name is ordered but has no descriptor
        let (mut material, names, mut registry) = setup("uniform weird uGhost;");
        let mut clock = SyncClock::new(0.0);
        sync_material(&mut material, &names, MeshKind::Plane, &mut registry, &mut clock, &frame(0.0));
        // the placeholder slot exists and nothing panicked
        assert_eq!(material.value("uGhost"), Some(&UniformValue::Float(0.0)));
    }
}
