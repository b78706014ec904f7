pub mod catalog;
pub mod parser;
pub mod registry;
pub mod resample;
pub mod sync;
pub mod value;

pub use catalog::{CatalogContext, DateStamp, ENGINE_MANAGED, WELL_KNOWN_NAMES};
pub use parser::{parse_uniforms, ParsedShader};
pub use registry::{SettingsPatch, UniformCallback, UniformDescriptor, UniformRegistry, UniformSettings};
pub use resample::{downsample, upsample};
pub use sync::{sync_material, sync_slots, AspectMode, FrameInput, MouseState, SyncClock};
pub use value::{GlslType, UniformValue};
