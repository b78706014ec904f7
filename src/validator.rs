//! GLSL shader validation
//!
//! Validates shader sources before a slot accepts them, to catch errors
//! early and surface readable messages through the panel collaborator.

use naga::front::glsl::{Frontend, Options};
use naga::ShaderStage;

use crate::errors::ShaderError;

/// Validates a fragment/vertex GLSL source pair
///
/// Performs the checks in order:
/// 1. Sources are not empty
/// 2. GLSL syntax validation via naga, per stage
/// 3. Module validation
pub fn validate_shader(fragment_src: &str, vertex_src: &str) -> Result<(), ShaderError> {
    if fragment_src.trim().is_empty() {
        return Err(ShaderError::Validation(
            "Fragment shader source is empty".to_string(),
        ));
    }
    if vertex_src.trim().is_empty() {
        return Err(ShaderError::Validation(
            "Vertex shader source is empty".to_string(),
        ));
    }

    validate_glsl_stage(fragment_src, ShaderStage::Fragment)?;
    validate_glsl_stage(vertex_src, ShaderStage::Vertex)?;

    Ok(())
}

/// Validate one GLSL stage using the naga parser
pub fn validate_glsl_stage(source: &str, stage: ShaderStage) -> Result<(), ShaderError> {
    log::debug!("Validating {:?} GLSL with naga parser", stage);

    let mut frontend = Frontend::default();
    let module = match frontend.parse(&Options::from(stage), source) {
        Ok(module) => {
            log::debug!("Naga parse successful");
            module
        }
        Err(parse_error) => {
            let error_msg = format!("GLSL Parse Error:\n{}", parse_error.emit_to_string(source));
            log::error!("Shader parse failed: {}", error_msg);
            return Err(ShaderError::Validation(error_msg));
        }
    };

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );

    if let Err(validation_error) = validator.validate(&module) {
        let error_msg = format!(
            "GLSL Validation Error:\n{}",
            validation_error.emit_to_string(source)
        );
        log::error!("Shader validation failed: {}", error_msg);
        return Err(ShaderError::Validation(error_msg));
    }

    log::debug!("Naga validation passed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_empty_shader() {
        let result = validate_shader("", "void main() {}");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_broken_fragment() {
        let result = validate_shader("this is not glsl", "void main() { gl_Position = vec4(0.0); }");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_minimal_pair() {
        let fragment = r#"
            #version 450
            layout(location = 0) out vec4 color;
            void main() { color = vec4(1.0); }
        "#;
        let vertex = r#"
            #version 450
            void main() { gl_Position = vec4(0.0, 0.0, 0.0, 1.0); }
        "#;
        assert!(validate_shader(fragment, vertex).is_ok());
    }
}
