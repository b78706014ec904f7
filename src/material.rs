//! Shader slot data: the program record and the material the rendering
//! collaborator consumes.

use std::collections::HashMap;

use crate::uniforms::registry::UniformRegistry;
use crate::uniforms::value::UniformValue;

/// One shader program's bookkeeping: sources, author, and the uniform names
/// in first-seen source order (the ordering drives the settings panel
/// layout).
#[derive(Debug, Clone, Default)]
pub struct ShaderProgramRecord {
    pub name: String,
    pub author: String,
    pub vertex_shader: String,
    pub fragment_shader: String,
    pub ordered_uniform_names: Vec<String>,
}

/// The mutable material the rendering engine reads each draw.
///
/// `uniforms` is the live name → value map; the synchronizer mutates values
/// in place and never swaps the map out.
#[derive(Debug, Clone)]
pub struct ShaderMaterial {
    pub vertex_shader: String,
    pub fragment_shader: String,
    pub transparent: bool,
    pub double_sided: bool,
    pub uniforms: HashMap<String, UniformValue>,
}

impl ShaderMaterial {
    pub fn new(vertex_shader: impl Into<String>, fragment_shader: impl Into<String>) -> Self {
        Self {
            vertex_shader: vertex_shader.into(),
            fragment_shader: fragment_shader.into(),
            transparent: true,
            double_sided: true,
            uniforms: HashMap::new(),
        }
    }

    /// Material pre-populated with the registry's current values for the
    /// given uniform names. Names without a descriptor (unknown declared
    /// types) are simply absent.
    pub fn from_registry(
        vertex_shader: impl Into<String>,
        fragment_shader: impl Into<String>,
        ordered_names: &[String],
        registry: &UniformRegistry,
    ) -> Self {
        let mut material = Self::new(vertex_shader, fragment_shader);
        for name in ordered_names {
            if let Some(desc) = registry.get(name) {
                material.uniforms.insert(name.clone(), desc.value.clone());
            }
        }
        material
    }

    pub fn value(&self, name: &str) -> Option<&UniformValue> {
        self.uniforms.get(name)
    }

    pub fn set_value(&mut self, name: impl Into<String>, value: UniformValue) {
        self.uniforms.insert(name.into(), value);
    }

    /// Packed bytes for one uniform, ready for the collaborator's upload
    /// path.
    pub fn uniform_bytes(&self, name: &str) -> Option<Vec<u8>> {
        self.uniforms.get(name).map(UniformValue::as_bytes)
    }
}
