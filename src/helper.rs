//! The shader helper: owns the shader slots, the canvas binding, the event
//! and clock state, and the per-tick synchronization entry points.
//!
//! Slots are parallel-indexed: `records[i]`, `materials[i]`, and `meshes[i]`
//! describe the same logical shader. The host's render loop calls [`tick`]
//! (or [`tick_all`]) once per frame and reads the materials' uniform maps.
//!
//! [`tick`]: ShaderHelper::tick
//! [`tick_all`]: ShaderHelper::tick_all

use std::collections::HashMap;
use std::time::Instant;

use log::{debug, info};

use crate::audio::SoundEngine;
use crate::config::HelperConfig;
use crate::errors::ShaderError;
use crate::geometry::{MeshKind, MeshView};
use crate::material::{ShaderMaterial, ShaderProgramRecord};
use crate::panel::{panel_controls, UniformControl};
use crate::preset::ShaderPreset;
use crate::shader_constants::{DEFAULT_FRAGMENT, DEFAULT_VERTEX};
use crate::texture::TextureData;
use crate::uniforms::catalog::{CatalogContext, DateStamp};
use crate::uniforms::parser::parse_uniforms;
use crate::uniforms::registry::{
    SettingsPatch, UniformCallback, UniformDescriptor, UniformRegistry, UniformSettings,
};
use crate::uniforms::sync::{sync_material, sync_slots, AspectMode, FrameInput, MouseState, SyncClock};
use crate::uniforms::value::UniformValue;

/// Capture callback producing the current canvas pixels for `iImage`.
pub type CaptureFn = Box<dyn FnMut(u32, u32) -> TextureData>;

/// Stand-in for the browser canvas: a size plus an optional pixel capture.
pub struct CanvasBinding {
    width: u32,
    height: u32,
    capture: Option<CaptureFn>,
}

impl CanvasBinding {
    /// A zero-sized binding is rejected outright; everything downstream
    /// assumes a real drawing surface.
    pub fn new(width: u32, height: u32) -> Result<Self, ShaderError> {
        if width == 0 || height == 0 {
            return Err(ShaderError::Canvas(format!(
                "canvas must have a non-zero size, got {width}x{height}"
            )));
        }
        Ok(Self {
            width,
            height,
            capture: None,
        })
    }

    pub fn with_capture(mut self, capture: CaptureFn) -> Self {
        self.capture = Some(capture);
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn capture(&mut self) -> Option<TextureData> {
        let (w, h) = (self.width, self.height);
        self.capture.as_mut().map(|f| f(w, h))
    }
}

pub struct ShaderHelper {
    canvas: CanvasBinding,
    audio: Option<SoundEngine>,
    config: HelperConfig,
    epoch: Instant,
    clock: SyncClock,
    mouse: MouseState,
    registry: UniformRegistry,
    records: Vec<ShaderProgramRecord>,
    materials: Vec<ShaderMaterial>,
    meshes: Vec<MeshView>,
}

impl ShaderHelper {
    /// Helper with the default audio-reactive fragment on slot 0.
    pub fn new(canvas: CanvasBinding, mesh: MeshKind) -> Self {
        Self::with_shader(canvas, mesh, DEFAULT_FRAGMENT, DEFAULT_VERTEX)
    }

    pub fn with_shader(
        canvas: CanvasBinding,
        mesh: MeshKind,
        fragment: &str,
        vertex: &str,
    ) -> Self {
        let ctx = CatalogContext::new(canvas.width, canvas.height);
        let parsed = parse_uniforms(fragment, &ctx);
        info!(
            "Discovered {} uniform(s) in initial shader",
            parsed.ordered_names.len()
        );

        let material =
            ShaderMaterial::from_registry(vertex, fragment, &parsed.ordered_names, &parsed.registry);
        let record = ShaderProgramRecord {
            name: "default".to_string(),
            author: String::new(),
            vertex_shader: vertex.to_string(),
            fragment_shader: fragment.to_string(),
            ordered_uniform_names: parsed.ordered_names,
        };
        let mesh_view = MeshView::new(mesh, canvas.width, canvas.height);

        Self {
            canvas,
            audio: None,
            config: HelperConfig::default(),
            epoch: Instant::now(),
            clock: SyncClock::new(0.0),
            mouse: MouseState::default(),
            registry: parsed.registry,
            records: vec![record],
            materials: vec![material],
            meshes: vec![mesh_view],
        }
    }

    pub fn set_config(&mut self, config: HelperConfig) {
        self.config = config;
    }

    /// Attach the audio engine feeding `iAudio`. Kept optional so headless
    /// hosts (and tests) can run without an output device.
    pub fn attach_audio(&mut self, audio: SoundEngine) {
        self.audio = Some(audio);
    }

    pub fn audio(&mut self) -> Option<&mut SoundEngine> {
        self.audio.as_mut()
    }

    // ------------------------------------------------------------------
    // event + surface intake
    // ------------------------------------------------------------------

    pub fn on_mouse_move(&mut self, x: f32, y: f32) {
        self.mouse.on_move(x, y);
    }

    pub fn on_mouse_down(&mut self, x: f32, y: f32) {
        self.mouse.on_down(x, y);
    }

    pub fn set_canvas_size(&mut self, width: u32, height: u32) {
        self.canvas.width = width.max(1);
        self.canvas.height = height.max(1);
    }

    // ------------------------------------------------------------------
    // slot management
    // ------------------------------------------------------------------

    pub fn slot_count(&self) -> usize {
        self.records.len()
    }

    pub fn record(&self, slot: usize) -> Option<&ShaderProgramRecord> {
        self.records.get(slot)
    }

    pub fn material(&self, slot: usize) -> Option<&ShaderMaterial> {
        self.materials.get(slot)
    }

    pub fn mesh(&self, slot: usize) -> Option<&MeshView> {
        self.meshes.get(slot)
    }

    pub fn registry(&self) -> &UniformRegistry {
        &self.registry
    }

    /// Replace one slot's shader pair. The registry is rebuilt wholesale
    /// from the new fragment, the material is replaced, and the clock
    /// restarts so `iTime` begins at zero for the new program.
    pub fn set_shader_from_text(
        &mut self,
        slot: usize,
        fragment: &str,
        vertex: &str,
        name: &str,
        author: &str,
    ) -> Result<(), ShaderError> {
        if slot >= self.records.len() {
            return Err(ShaderError::Slot(slot));
        }

        let ctx = CatalogContext::new(self.canvas.width, self.canvas.height);
        let parsed = parse_uniforms(fragment, &ctx);
        debug!(
            "Reloaded slot {}: {} uniform(s)",
            slot,
            parsed.ordered_names.len()
        );

        self.registry = parsed.registry;
        self.materials[slot] =
            ShaderMaterial::from_registry(vertex, fragment, &parsed.ordered_names, &self.registry);

        let record = &mut self.records[slot];
        record.name = name.to_string();
        record.author = author.to_string();
        record.vertex_shader = vertex.to_string();
        record.fragment_shader = fragment.to_string();
        record.ordered_uniform_names = parsed.ordered_names;

        let now = self.now_ms();
        self.clock.restart(now);
        self.sync_one(slot);
        Ok(())
    }

    /// Append a new shader slot; returns its index.
    pub fn add_shader_mesh(
        &mut self,
        fragment: &str,
        vertex: &str,
        kind: MeshKind,
        name: &str,
        author: &str,
    ) -> usize {
        let ctx = CatalogContext::new(self.canvas.width, self.canvas.height);
        let parsed = parse_uniforms(fragment, &ctx);

        let material =
            ShaderMaterial::from_registry(vertex, fragment, &parsed.ordered_names, &parsed.registry);

        self.registry = parsed.registry;
        self.records.push(ShaderProgramRecord {
            name: name.to_string(),
            author: author.to_string(),
            vertex_shader: vertex.to_string(),
            fragment_shader: fragment.to_string(),
            ordered_uniform_names: parsed.ordered_names,
        });
        self.materials.push(material);
        self.meshes
            .push(MeshView::new(kind, self.canvas.width, self.canvas.height));

        let slot = self.records.len() - 1;
        self.sync_one(slot);
        slot
    }

    pub fn set_mesh_geometry(&mut self, slot: usize, kind: MeshKind) -> Result<(), ShaderError> {
        let mesh = self.meshes.get_mut(slot).ok_or(ShaderError::Slot(slot))?;
        *mesh = MeshView::new(kind, self.canvas.width, self.canvas.height);
        Ok(())
    }

    pub fn set_mesh_rotation(
        &mut self,
        slot: usize,
        x: f32,
        y: f32,
        z: f32,
    ) -> Result<(), ShaderError> {
        let mesh = self.meshes.get_mut(slot).ok_or(ShaderError::Slot(slot))?;
        mesh.rotation = [x, y, z];
        Ok(())
    }

    // ------------------------------------------------------------------
    // uniform plumbing
    // ------------------------------------------------------------------

    /// Bind a texture to `iChannel<channel>`, extending the channel
    /// resolution/time banks when the index is past the default four.
    pub fn set_channel_texture(
        &mut self,
        channel: usize,
        texture: TextureData,
        slot: usize,
    ) -> Result<(), ShaderError> {
        if slot >= self.materials.len() {
            return Err(ShaderError::Slot(slot));
        }

        let name = format!("iChannel{channel}");
        let elapsed = (self.now_ms() * 0.001) as f32;

        if let Some(desc) = self.registry.get_mut("iChannelResolution") {
            if let UniformValue::Vec3Array(resolutions) = &mut desc.value {
                while resolutions.len() <= channel {
                    resolutions.push(glam::Vec3::ZERO);
                }
                resolutions[channel] =
                    glam::Vec3::new(texture.width as f32, texture.height as f32, 0.0);
            }
        }
        if let Some(desc) = self.registry.get_mut("iChannelTime") {
            if let UniformValue::FloatArray(times) = &mut desc.value {
                while times.len() <= channel {
                    times.push(elapsed);
                }
            }
        }

        let value = UniformValue::Texture(texture);
        match self.registry.get_mut(&name) {
            Some(desc) => desc.value = value.clone(),
            None => self
                .registry
                .insert(name.clone(), UniformDescriptor::from_default(value.clone())),
        }

        let material = &mut self.materials[slot];
        material.uniforms.insert(name, value);
        for bank in ["iChannelResolution", "iChannelTime"] {
            if let Some(desc) = self.registry.get(bank) {
                material.uniforms.insert(bank.to_string(), desc.value.clone());
            }
        }
        Ok(())
    }

    /// Register a custom uniform with settings (and optionally a per-tick
    /// callback) without it appearing in any shader source yet.
    pub fn add_uniform_setting(
        &mut self,
        name: &str,
        default: UniformValue,
        callback: Option<UniformCallback>,
        min: f64,
        max: f64,
        step: f64,
    ) {
        let mut settings = UniformSettings::with_range(default.clone(), min, max, step);
        settings.callback = callback;
        self.registry.insert(
            name,
            UniformDescriptor::new(default.glsl_type(), default.array_len(), default, settings),
        );
    }

    pub fn update_uniform_settings(&mut self, patches: HashMap<String, SettingsPatch>) {
        self.registry.update_settings(patches);
    }

    /// Overwrite registry values directly (the next tick propagates them to
    /// materials through the usual rules).
    pub fn set_uniforms(&mut self, values: HashMap<String, UniformValue>) {
        for (name, value) in values {
            match self.registry.get_mut(&name) {
                Some(desc) => desc.value = value,
                None => self
                    .registry
                    .insert(name, UniformDescriptor::from_default(value)),
            }
        }
    }

    /// Put every uniform of a slot back to its settings default.
    pub fn reset_material_uniforms(&mut self, slot: usize) -> Result<(), ShaderError> {
        if slot >= self.materials.len() {
            return Err(ShaderError::Slot(slot));
        }
        for name in &self.records[slot].ordered_uniform_names {
            if let Some(desc) = self.registry.get_mut(name) {
                desc.value = desc.settings.default.clone();
                self.materials[slot]
                    .uniforms
                    .insert(name.clone(), desc.value.clone());
            }
        }
        Ok(())
    }

    /// Settings-panel write-back: set one scalar component of a uniform on
    /// the live material.
    pub fn set_uniform_component(
        &mut self,
        slot: usize,
        name: &str,
        component: Option<usize>,
        value: f64,
    ) -> Result<(), ShaderError> {
        let material = self.materials.get_mut(slot).ok_or(ShaderError::Slot(slot))?;
        let entry = material
            .uniforms
            .entry(name.to_string())
            .or_insert(UniformValue::Float(0.0));
        entry.set_component(component.unwrap_or(0), value);
        Ok(())
    }

    /// Control descriptors for the settings-panel collaborator.
    pub fn panel_controls(&self, slot: usize) -> Result<Vec<UniformControl>, ShaderError> {
        let record = self.records.get(slot).ok_or(ShaderError::Slot(slot))?;
        Ok(panel_controls(
            &record.ordered_uniform_names,
            &self.materials[slot],
            &self.registry,
        ))
    }

    // ------------------------------------------------------------------
    // presets
    // ------------------------------------------------------------------

    pub fn load_preset(&mut self, preset: &ShaderPreset, slot: usize) -> Result<(), ShaderError> {
        self.set_shader_from_text(
            slot,
            &preset.fragment,
            preset.vertex_or_default(),
            &preset.name,
            &preset.author,
        )
    }

    pub fn export_preset(&self, slot: usize) -> Result<ShaderPreset, ShaderError> {
        let record = self.records.get(slot).ok_or(ShaderError::Slot(slot))?;
        Ok(ShaderPreset::from_record(record))
    }

    // ------------------------------------------------------------------
    // per-frame updates
    // ------------------------------------------------------------------

    /// Per-frame update, one pass per slot with that slot's own mesh-kind
    /// aspect rule. The host render loop calls this once per frame.
    pub fn tick(&mut self) {
        self.run_tick(AspectMode::PerMesh);
    }

    /// Batched per-frame update: every uniform name is computed once and
    /// fanned out, using the first slot's mesh kind for `iResolution`.
    pub fn tick_all(&mut self) {
        self.run_tick(AspectMode::SharedFirstMesh);
    }

    fn run_tick(&mut self, mode: AspectMode) {
        let frame = self.frame_input();
        let kinds: Vec<MeshKind> = self.meshes.iter().map(|m| m.kind).collect();
        sync_slots(
            &mut self.materials,
            &self.records,
            &kinds,
            mode,
            &mut self.registry,
            &mut self.clock,
            &frame,
        );
        if let Some(audio) = self.audio.as_mut() {
            audio.poll_triggers();
        }
    }

    fn sync_one(&mut self, slot: usize) {
        let frame = self.frame_input();
        let kind = self.meshes[slot].kind;
        sync_material(
            &mut self.materials[slot],
            &self.records[slot].ordered_uniform_names,
            kind,
            &mut self.registry,
            &mut self.clock,
            &frame,
        );
    }

    fn now_ms(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64() * 1000.0
    }

    fn frame_input(&mut self) -> FrameInput {
        let wants_image = self
            .records
            .iter()
            .any(|r| r.ordered_uniform_names.iter().any(|n| n == "iImage"));
        let capture = if wants_image {
            self.canvas.capture()
        } else {
            None
        };

        let audio_bins = match self.audio.as_mut() {
            Some(engine) if engine.playing() => Some(engine.get_analyzer_data(self.config.fft_size)),
            _ => None,
        };

        FrameInput {
            now_ms: self.now_ms(),
            canvas_width: self.canvas.width,
            canvas_height: self.canvas.height,
            mouse: self.mouse,
            date: DateStamp::now(),
            capture,
            audio_bins,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uniforms::value::UniformValue;

    fn helper() -> ShaderHelper {
        let canvas = CanvasBinding::new(800, 600).unwrap();
        ShaderHelper::new(canvas, MeshKind::Plane)
    }

    #[test]
    fn test_zero_sized_canvas_is_fatal() {
        assert!(CanvasBinding::new(0, 600).is_err());
        assert!(CanvasBinding::new(800, 0).is_err());
    }

    #[test]
    fn test_default_shader_discovers_uniforms() {
        let helper = helper();
        let record = helper.record(0).unwrap();
        assert!(record
            .ordered_uniform_names
            .iter()
            .any(|n| n == "iAudio"));
        assert!(helper.registry().contains("iHEG"));
    }

    #[test]
    fn test_tick_advances_frame_and_time() {
        let canvas = CanvasBinding::new(800, 600).unwrap();
        let mut helper = ShaderHelper::with_shader(
            canvas,
            MeshKind::Plane,
            "uniform float iTime;\nuniform int iFrame;",
            DEFAULT_VERTEX,
        );

        helper.tick();
        helper.tick();

        let material = helper.material(0).unwrap();
        assert_eq!(material.value("iFrame"), Some(&UniformValue::Int(2)));
        match material.value("iTime") {
            Some(UniformValue::Float(t)) => assert!(*t >= 0.0),
            other => panic!("unexpected iTime {:?}", other),
        }
    }

    #[test]
    fn test_reload_supersedes_registry_wholesale() {
        let canvas = CanvasBinding::new(800, 600).unwrap();
        let mut helper = ShaderHelper::with_shader(
            canvas,
            MeshKind::Plane,
            "uniform float uOld;",
            DEFAULT_VERTEX,
        );
        assert!(helper.registry().contains("uOld"));

        helper
            .set_shader_from_text(0, "uniform float uNew;", DEFAULT_VERTEX, "swapped", "")
            .unwrap();

        assert!(!helper.registry().contains("uOld"));
        assert!(helper.registry().contains("uNew"));
        assert_eq!(helper.record(0).unwrap().name, "swapped");
        assert_eq!(
            helper.record(0).unwrap().ordered_uniform_names,
            vec!["uNew"]
        );
    }

    #[test]
    fn test_mouse_click_is_sticky_across_ticks() {
        let canvas = CanvasBinding::new(800, 600).unwrap();
        let mut helper = ShaderHelper::with_shader(
            canvas,
            MeshKind::Plane,
            "uniform float iMouseInput;",
            DEFAULT_VERTEX,
        );

        helper.tick();
        assert_eq!(
            helper.material(0).unwrap().value("iMouseInput"),
            Some(&UniformValue::Float(0.0))
        );

        helper.on_mouse_down(10.0, 20.0);
        helper.tick();
        helper.tick();
        assert_eq!(
            helper.material(0).unwrap().value("iMouseInput"),
            Some(&UniformValue::Float(1.0))
        );
    }

    #[test]
    fn test_channel_texture_updates_banks() {
        let canvas = CanvasBinding::new(800, 600).unwrap();
        let mut helper = ShaderHelper::with_shader(
            canvas,
            MeshKind::Plane,
            "uniform sampler2D iChannel1;\nuniform vec3 iChannelResolution[4];",
            DEFAULT_VERTEX,
        );

        let texture = TextureData::blank(64, 32);
        helper.set_channel_texture(1, texture, 0).unwrap();

        match helper.registry().get("iChannelResolution").map(|d| &d.value) {
            Some(UniformValue::Vec3Array(res)) => {
                assert_eq!(res[1], glam::Vec3::new(64.0, 32.0, 0.0));
            }
            other => panic!("unexpected bank {:?}", other),
        }
        match helper.material(0).unwrap().value("iChannel1") {
            Some(UniformValue::Texture(t)) => assert_eq!((t.width, t.height), (64, 32)),
            other => panic!("unexpected channel value {:?}", other),
        }
    }

    #[test]
    fn test_add_shader_mesh_appends_slot() {
        let mut helper = helper();
        let slot = helper.add_shader_mesh(
            "uniform float uGlow;",
            DEFAULT_VERTEX,
            MeshKind::Sphere,
            "second",
            "author",
        );
        assert_eq!(slot, 1);
        assert_eq!(helper.slot_count(), 2);
        assert_eq!(helper.mesh(1).unwrap().kind, MeshKind::Sphere);
    }

    #[test]
    fn test_preset_round_trip() {
        let mut helper = helper();
        let preset = helper.export_preset(0).unwrap();
        let json = preset.to_json(true).unwrap();

        let loaded = ShaderPreset::from_json(&json).unwrap();
        helper.load_preset(&loaded, 0).unwrap();
        assert_eq!(
            helper.record(0).unwrap().fragment_shader,
            preset.fragment
        );
    }

    #[test]
    fn test_set_uniform_component_writes_material() {
        let canvas = CanvasBinding::new(800, 600).unwrap();
        let mut helper = ShaderHelper::with_shader(
            canvas,
            MeshKind::Plane,
            "uniform vec3 uTint;",
            DEFAULT_VERTEX,
        );

        helper.set_uniform_component(0, "uTint", Some(1), 0.5).unwrap();
        match helper.material(0).unwrap().value("uTint") {
            Some(UniformValue::Vec3(v)) => assert_eq!(v.y, 0.5),
            other => panic!("unexpected uTint {:?}", other),
        }
    }

    #[test]
    fn test_panel_controls_exposed_per_slot() {
        let helper = helper();
        let controls = helper.panel_controls(0).unwrap();
        // default fragment: biosignal scalars are tunable, engine names are not
        assert!(controls.iter().any(|c| c.name == "iHEG"));
        assert!(!controls.iter().any(|c| c.name == "iResolution"));
        assert!(helper.panel_controls(9).is_err());
    }

    #[test]
    fn test_reset_material_uniforms_restores_defaults() {
        let canvas = CanvasBinding::new(800, 600).unwrap();
        let mut helper = ShaderHelper::with_shader(
            canvas,
            MeshKind::Plane,
            "uniform float uGain;",
            DEFAULT_VERTEX,
        );

        helper.set_uniform_component(0, "uGain", None, 9.0).unwrap();
        helper.reset_material_uniforms(0).unwrap();
        assert_eq!(
            helper.material(0).unwrap().value("uGain"),
            Some(&UniformValue::Float(0.0))
        );
    }
}
