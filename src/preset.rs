use serde::{Deserialize, Serialize};

use crate::errors::ShaderError;
use crate::material::ShaderProgramRecord;
use crate::shader_constants::DEFAULT_VERTEX;

/// JSON shader format for preset exports
/// Supports both plain text and base64-encoded shaders
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShaderPreset {
    #[serde(default = "default_version")]
    pub version: String,

    /// Encoding format: "plain" or "base64" (default: "plain")
    #[serde(default = "default_encoding")]
    pub encoding: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub author: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertex: Option<String>,

    pub fragment: String, // required
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_encoding() -> String {
    "plain".to_string()
}

impl ShaderPreset {
    /// Parse a preset from JSON and decode base64 sources if needed
    pub fn from_json(json_str: &str) -> Result<Self, ShaderError> {
        let mut preset: Self = serde_json::from_str(json_str)?;

        if preset.encoding == "base64" {
            preset.fragment = decode_base64(&preset.fragment).unwrap_or(preset.fragment);
            if let Some(ref vertex) = preset.vertex {
                preset.vertex = Some(decode_base64(vertex).unwrap_or_else(|| vertex.clone()));
            }
            preset.encoding = "plain".to_string();
        }

        Ok(preset)
    }

    /// Serialize to JSON, base64-encoding the sources when requested
    pub fn to_json(&self, base64_encode: bool) -> Result<String, ShaderError> {
        let mut preset = self.clone();
        if base64_encode {
            preset.encoding = "base64".to_string();
            preset.fragment = encode_base64(&preset.fragment);
            preset.vertex = preset.vertex.as_deref().map(encode_base64);
        } else {
            preset.encoding = "plain".to_string();
        }
        Ok(serde_json::to_string_pretty(&preset)?)
    }

    pub fn from_record(record: &ShaderProgramRecord) -> Self {
        Self {
            version: default_version(),
            encoding: default_encoding(),
            name: record.name.clone(),
            author: record.author.clone(),
            vertex: Some(record.vertex_shader.clone()),
            fragment: record.fragment_shader.clone(),
        }
    }

    /// Vertex source, falling back to the standard UV passthrough
    pub fn vertex_or_default(&self) -> &str {
        self.vertex.as_deref().unwrap_or(DEFAULT_VERTEX)
    }
}

/// Encode shader code to base64 for safe JSON storage
fn encode_base64(code: &str) -> String {
    base64::Engine::encode(&base64::engine::general_purpose::STANDARD, code.as_bytes())
}

/// Decode base64 string to UTF-8 text
fn decode_base64(encoded: &str) -> Option<String> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(encoded.as_bytes())
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
}
