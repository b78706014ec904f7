//! Shader uniform helper.
//!
//! Binds a GLSL fragment/vertex pair to a mesh slot, discovers the shader's
//! uniforms by scanning the source text, and feeds them a catalog of
//! time/mouse/audio/biosignal values once per render tick. A companion audio
//! engine supplies the FFT spectrum feed. The actual GPU work (scene,
//! camera, tessellation, widgets) belongs to the host; this crate owns the
//! data contracts.

pub mod audio;
pub mod config;
pub mod errors;
pub mod geometry;
pub mod helper;
pub mod material;
pub mod panel;
pub mod preset;
pub mod shader_constants;
pub mod texture;
pub mod uniforms;
pub mod validator;

pub use audio::{SoundBuffer, SoundEngine, Waveform};
pub use config::HelperConfig;
pub use errors::ShaderError;
pub use geometry::{create_mesh_geometry, GeometryDescriptor, MeshKind, MeshView};
pub use helper::{CanvasBinding, ShaderHelper};
pub use material::{ShaderMaterial, ShaderProgramRecord};
pub use panel::UniformControl;
pub use preset::ShaderPreset;
pub use shader_constants::{DEFAULT_FRAGMENT, DEFAULT_VERTEX, JULIA_FRAGMENT};
pub use texture::TextureData;
pub use uniforms::{
    downsample, parse_uniforms, upsample, AspectMode, FrameInput, GlslType, MouseState,
    SyncClock, UniformRegistry, UniformValue,
};
pub use validator::validate_shader;
