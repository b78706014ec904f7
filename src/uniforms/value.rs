//! GLSL type tokens and the tagged runtime value container.
//!
//! Every uniform carries a `UniformValue` whose variant never changes after
//! discovery; the synchronizer and the settings panel both rely on that.

use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};

use crate::texture::TextureData;

/// GLSL type classes the parser recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlslType {
    Float,
    Int,
    Bool,
    Vec2,
    Vec3,
    Vec4,
    Mat3,
    Mat4,
    Sampler,
}

impl GlslType {
    /// Classify a declared type token.
    ///
    /// Tokens are matched exactly (sampler variants by prefix, since GLSL
    /// spells them `sampler2D`, `samplerCube`, ...). A token like
    /// `floatArray` is not a float.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "float" => Some(GlslType::Float),
            "int" | "uint" => Some(GlslType::Int),
            "bool" => Some(GlslType::Bool),
            "vec2" => Some(GlslType::Vec2),
            "vec3" => Some(GlslType::Vec3),
            "vec4" => Some(GlslType::Vec4),
            "mat3" => Some(GlslType::Mat3),
            "mat4" => Some(GlslType::Mat4),
            t if t.starts_with("sampler") || t.starts_with("isampler") || t.starts_with("usampler") => {
                Some(GlslType::Sampler)
            }
            _ => None,
        }
    }

    /// Default runtime value for this type at the given array size
    /// (1 = scalar). Arrays are filled with the scalar zero-equivalent;
    /// matrices default to identity.
    pub fn default_value(&self, array_size: usize) -> UniformValue {
        match (self, array_size) {
            (GlslType::Float, 1) => UniformValue::Float(0.0),
            (GlslType::Float, n) => UniformValue::FloatArray(vec![0.0; n]),
            (GlslType::Int, 1) => UniformValue::Int(0),
            (GlslType::Int, n) => UniformValue::IntArray(vec![0; n]),
            (GlslType::Bool, 1) => UniformValue::Bool(false),
            (GlslType::Bool, n) => UniformValue::BoolArray(vec![false; n]),
            (GlslType::Vec2, 1) => UniformValue::Vec2(Vec2::ZERO),
            (GlslType::Vec2, n) => UniformValue::Vec2Array(vec![Vec2::ZERO; n]),
            (GlslType::Vec3, 1) => UniformValue::Vec3(Vec3::ZERO),
            (GlslType::Vec3, n) => UniformValue::Vec3Array(vec![Vec3::ZERO; n]),
            (GlslType::Vec4, 1) => UniformValue::Vec4(Vec4::ZERO),
            (GlslType::Vec4, n) => UniformValue::Vec4Array(vec![Vec4::ZERO; n]),
            (GlslType::Mat3, 1) => UniformValue::Mat3(Mat3::IDENTITY),
            (GlslType::Mat3, n) => UniformValue::Mat3Array(vec![Mat3::IDENTITY; n]),
            (GlslType::Mat4, 1) => UniformValue::Mat4(Mat4::IDENTITY),
            (GlslType::Mat4, n) => UniformValue::Mat4Array(vec![Mat4::IDENTITY; n]),
            (GlslType::Sampler, _) => UniformValue::Texture(TextureData::blank_default()),
        }
    }
}

/// Runtime value container for one uniform.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Bool(bool),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat3(Mat3),
    Mat4(Mat4),
    FloatArray(Vec<f32>),
    IntArray(Vec<i32>),
    BoolArray(Vec<bool>),
    Vec2Array(Vec<Vec2>),
    Vec3Array(Vec<Vec3>),
    Vec4Array(Vec<Vec4>),
    Mat3Array(Vec<Mat3>),
    Mat4Array(Vec<Mat4>),
    Texture(TextureData),
}

impl UniformValue {
    pub fn glsl_type(&self) -> GlslType {
        match self {
            UniformValue::Float(_) | UniformValue::FloatArray(_) => GlslType::Float,
            UniformValue::Int(_) | UniformValue::IntArray(_) => GlslType::Int,
            UniformValue::Bool(_) | UniformValue::BoolArray(_) => GlslType::Bool,
            UniformValue::Vec2(_) | UniformValue::Vec2Array(_) => GlslType::Vec2,
            UniformValue::Vec3(_) | UniformValue::Vec3Array(_) => GlslType::Vec3,
            UniformValue::Vec4(_) | UniformValue::Vec4Array(_) => GlslType::Vec4,
            UniformValue::Mat3(_) | UniformValue::Mat3Array(_) => GlslType::Mat3,
            UniformValue::Mat4(_) | UniformValue::Mat4Array(_) => GlslType::Mat4,
            UniformValue::Texture(_) => GlslType::Sampler,
        }
    }

    /// Declared array length (1 for scalars and single vectors/matrices).
    pub fn array_len(&self) -> usize {
        match self {
            UniformValue::FloatArray(v) => v.len(),
            UniformValue::IntArray(v) => v.len(),
            UniformValue::BoolArray(v) => v.len(),
            UniformValue::Vec2Array(v) => v.len(),
            UniformValue::Vec3Array(v) => v.len(),
            UniformValue::Vec4Array(v) => v.len(),
            UniformValue::Mat3Array(v) => v.len(),
            UniformValue::Mat4Array(v) => v.len(),
            _ => 1,
        }
    }

    /// Number of tunable scalar components (0 for textures and long arrays).
    ///
    /// Only single vectors/matrices split into per-component panel controls;
    /// data-feed arrays are overwritten every tick and are not tunable.
    pub fn component_count(&self) -> usize {
        match self {
            UniformValue::Float(_) | UniformValue::Int(_) | UniformValue::Bool(_) => 1,
            UniformValue::Vec2(_) => 2,
            UniformValue::Vec3(_) => 3,
            UniformValue::Vec4(_) => 4,
            UniformValue::Mat3(_) => 9,
            UniformValue::Mat4(_) => 16,
            _ => 0,
        }
    }

    pub fn component(&self, index: usize) -> Option<f64> {
        match self {
            UniformValue::Float(v) if index == 0 => Some(*v as f64),
            UniformValue::Int(v) if index == 0 => Some(*v as f64),
            UniformValue::Bool(v) if index == 0 => Some(if *v { 1.0 } else { 0.0 }),
            UniformValue::Vec2(v) => v.to_array().get(index).map(|c| *c as f64),
            UniformValue::Vec3(v) => v.to_array().get(index).map(|c| *c as f64),
            UniformValue::Vec4(v) => v.to_array().get(index).map(|c| *c as f64),
            UniformValue::Mat3(m) => m.to_cols_array().get(index).map(|c| *c as f64),
            UniformValue::Mat4(m) => m.to_cols_array().get(index).map(|c| *c as f64),
            _ => None,
        }
    }

    /// Write one scalar component back, keeping the variant fixed.
    /// Out-of-range indices are ignored.
    pub fn set_component(&mut self, index: usize, value: f64) {
        match self {
            UniformValue::Float(v) => {
                if index == 0 {
                    *v = value as f32;
                }
            }
            UniformValue::Int(v) => {
                if index == 0 {
                    *v = value as i32;
                }
            }
            UniformValue::Bool(v) => {
                if index == 0 {
                    *v = value != 0.0;
                }
            }
            UniformValue::Vec2(v) => {
                let mut a = v.to_array();
                if let Some(c) = a.get_mut(index) {
                    *c = value as f32;
                    *v = Vec2::from_array(a);
                }
            }
            UniformValue::Vec3(v) => {
                let mut a = v.to_array();
                if let Some(c) = a.get_mut(index) {
                    *c = value as f32;
                    *v = Vec3::from_array(a);
                }
            }
            UniformValue::Vec4(v) => {
                let mut a = v.to_array();
                if let Some(c) = a.get_mut(index) {
                    *c = value as f32;
                    *v = Vec4::from_array(a);
                }
            }
            UniformValue::Mat3(m) => {
                let mut a = m.to_cols_array();
                if let Some(c) = a.get_mut(index) {
                    *c = value as f32;
                    *m = Mat3::from_cols_array(&a);
                }
            }
            UniformValue::Mat4(m) => {
                let mut a = m.to_cols_array();
                if let Some(c) = a.get_mut(index) {
                    *c = value as f32;
                    *m = Mat4::from_cols_array(&a);
                }
            }
            _ => {}
        }
    }

    /// Raw bytes for the rendering collaborator's uniform upload.
    ///
    /// Numeric values pack as tightly ordered f32/i32 words; bools pack as
    /// u32 (0/1); textures yield their RGBA pixel bytes.
    pub fn as_bytes(&self) -> Vec<u8> {
        match self {
            UniformValue::Float(v) => bytemuck::bytes_of(v).to_vec(),
            UniformValue::Int(v) => bytemuck::bytes_of(v).to_vec(),
            UniformValue::Bool(v) => bytemuck::bytes_of(&(*v as u32)).to_vec(),
            UniformValue::Vec2(v) => bytemuck::cast_slice(&v.to_array()).to_vec(),
            UniformValue::Vec3(v) => bytemuck::cast_slice(&v.to_array()).to_vec(),
            UniformValue::Vec4(v) => bytemuck::cast_slice(&v.to_array()).to_vec(),
            UniformValue::Mat3(m) => bytemuck::cast_slice(&m.to_cols_array()).to_vec(),
            UniformValue::Mat4(m) => bytemuck::cast_slice(&m.to_cols_array()).to_vec(),
            UniformValue::FloatArray(v) => bytemuck::cast_slice(v).to_vec(),
            UniformValue::IntArray(v) => bytemuck::cast_slice(v).to_vec(),
            UniformValue::BoolArray(v) => {
                let words: Vec<u32> = v.iter().map(|&b| b as u32).collect();
                bytemuck::cast_slice(&words).to_vec()
            }
            UniformValue::Vec2Array(v) => v
                .iter()
                .flat_map(|e| bytemuck::cast_slice(&e.to_array()).to_vec())
                .collect(),
            UniformValue::Vec3Array(v) => v
                .iter()
                .flat_map(|e| bytemuck::cast_slice(&e.to_array()).to_vec())
                .collect(),
            UniformValue::Vec4Array(v) => v
                .iter()
                .flat_map(|e| bytemuck::cast_slice(&e.to_array()).to_vec())
                .collect(),
            UniformValue::Mat3Array(v) => v
                .iter()
                .flat_map(|e| bytemuck::cast_slice(&e.to_cols_array()).to_vec())
                .collect(),
            UniformValue::Mat4Array(v) => v
                .iter()
                .flat_map(|e| bytemuck::cast_slice(&e.to_cols_array()).to_vec())
                .collect(),
            UniformValue::Texture(t) => t.data.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_token_classification() {
        assert_eq!(GlslType::from_token("float"), Some(GlslType::Float));
        assert_eq!(GlslType::from_token("sampler2D"), Some(GlslType::Sampler));
        assert_eq!(GlslType::from_token("samplerCube"), Some(GlslType::Sampler));
        // substring matches must not classify
        assert_eq!(GlslType::from_token("floatArray"), None);
        assert_eq!(GlslType::from_token("vec2x"), None);
        assert_eq!(GlslType::from_token("point"), None);
    }

    #[test]
    fn test_array_defaults_are_zero_filled() {
        match GlslType::Float.default_value(4) {
            UniformValue::FloatArray(v) => assert_eq!(v, vec![0.0; 4]),
            other => panic!("unexpected default {:?}", other),
        }
        match GlslType::Vec3.default_value(2) {
            UniformValue::Vec3Array(v) => assert_eq!(v, vec![Vec3::ZERO; 2]),
            other => panic!("unexpected default {:?}", other),
        }
    }

    #[test]
    fn test_component_round_trip() {
        let mut v = UniformValue::Vec4(Vec4::ZERO);
        v.set_component(2, 7.5);
        assert_eq!(v.component(2), Some(7.5));
        assert_eq!(v.component(0), Some(0.0));
        assert_eq!(v.component_count(), 4);
    }

    #[test]
    fn test_bytes_length() {
        assert_eq!(UniformValue::Float(1.0).as_bytes().len(), 4);
        assert_eq!(UniformValue::Vec4(Vec4::ONE).as_bytes().len(), 16);
        assert_eq!(UniformValue::Mat4(Mat4::IDENTITY).as_bytes().len(), 64);
        assert_eq!(UniformValue::FloatArray(vec![0.0; 256]).as_bytes().len(), 1024);
    }
}
