//! Uniform discovery by scanning raw GLSL source text.
//!
//! Two passes over the source: `#define NAME N` directives build an integer
//! symbol table, then `uniform TYPE NAME[SIZE];` declarations are collected
//! in order. Preprocessor scoping is deliberately ignored; a declaration
//! anywhere in the text counts. The parser never fails: unresolvable array
//! sizes fall back to 1 and unrecognized type tokens record the name without
//! a descriptor.

use std::collections::HashMap;

use regex::Regex;

use super::catalog::{self, CatalogContext};
use super::registry::{UniformDescriptor, UniformRegistry, UniformSettings};
use super::value::{GlslType, UniformValue};

/// Result of scanning one shader source: names in first-seen order plus the
/// merged registry.
#[derive(Debug, Default)]
pub struct ParsedShader {
    pub ordered_names: Vec<String>,
    pub registry: UniformRegistry,
}

/// Scan shader source for `#define` array sizes and `uniform` declarations.
///
/// Well-known names take their value and settings from the catalog, ignoring
/// the declared type. Everything else is classified by its exact type token.
/// A name declared twice keeps the later descriptor but its first position
/// in the ordered list.
pub fn parse_uniforms(source: &str, ctx: &CatalogContext) -> ParsedShader {
    let defines = scan_defines(source);

    let uniform_re = Regex::new(r"uniform\s+(\w+)\s+(\w+)\s*(?:\[\s*(\w+)\s*\])?\s*;")
        .expect("uniform pattern is valid");

    let mut parsed = ParsedShader::default();

    for caps in uniform_re.captures_iter(source) {
        let type_token = &caps[1];
        let name = caps[2].to_string();

        let array_size = caps
            .get(3)
            .map(|size| resolve_array_size(size.as_str(), &defines))
            .unwrap_or(1);

        if !parsed.ordered_names.contains(&name) {
            parsed.ordered_names.push(name.clone());
        }

        if let Some(descriptor) = catalog::lookup(&name, ctx) {
            parsed.registry.insert(name, descriptor);
            continue;
        }

        match GlslType::from_token(type_token) {
            Some(glsl_type) => {
                let value = glsl_type.default_value(array_size);
                let settings = inferred_settings(glsl_type, &value);
                parsed
                    .registry
                    .insert(name, UniformDescriptor::new(glsl_type, array_size, value, settings));
            }
            None => {
                log::debug!("unrecognized uniform type '{}' for '{}'", type_token, name);
            }
        }
    }

    parsed
}

/// Collect `#define <IDENT> <INTEGER>` pairs; later definitions win.
fn scan_defines(source: &str) -> HashMap<String, usize> {
    let define_re = Regex::new(r"#define\s+(\w+)\s+(\d+)").expect("define pattern is valid");
    let mut defines = HashMap::new();
    for caps in define_re.captures_iter(source) {
        if let Ok(n) = caps[2].parse::<usize>() {
            defines.insert(caps[1].to_string(), n);
        }
    }
    defines
}

/// Literal integer, or a symbol from the define table; anything else is 1.
fn resolve_array_size(token: &str, defines: &HashMap<String, usize>) -> usize {
    defines
        .get(token)
        .copied()
        .or_else(|| token.parse().ok())
        .unwrap_or(1)
        .max(1)
}

/// Panel ranges for type-inferred uniforms; samplers, bools, and matrices
/// carry no range.
fn inferred_settings(glsl_type: GlslType, value: &UniformValue) -> UniformSettings {
    match glsl_type {
        GlslType::Float | GlslType::Int => {
            UniformSettings::with_range(value.clone(), 0.0, 100.0, 1.0)
        }
        GlslType::Vec2 | GlslType::Vec3 | GlslType::Vec4 => {
            UniformSettings::with_range(value.clone(), 0.0, 1000.0, 1.0)
        }
        _ => UniformSettings::new(value.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader_constants::DEFAULT_FRAGMENT;

    fn ctx() -> CatalogContext {
        CatalogContext::new(800, 600)
    }

    #[test]
    fn test_well_known_name_takes_catalog_entry() {
        let parsed = parse_uniforms("uniform float iHEG;", &ctx());
        let desc = parsed.registry.get("iHEG").expect("iHEG present");
        assert_eq!(desc.value, UniformValue::Float(0.0));
        assert_eq!(desc.settings.min, Some(-3.0));
        assert_eq!(desc.settings.max, Some(3.0));
        assert_eq!(desc.settings.step, Some(0.1));
    }

    #[test]
    fn test_define_resolves_array_size() {
        let parsed = parse_uniforms("#define N 4\nuniform float custom[N];", &ctx());
        let desc = parsed.registry.get("custom").unwrap();
        assert_eq!(desc.array_size, 4);
        assert_eq!(desc.value, UniformValue::FloatArray(vec![0.0; 4]));
    }

    #[test]
    fn test_literal_array_size() {
        let parsed = parse_uniforms("uniform vec2 pts[3];", &ctx());
        let desc = parsed.registry.get("pts").unwrap();
        assert_eq!(desc.array_size, 3);
    }

    #[test]
    fn test_unresolved_symbol_defaults_to_scalar() {
        let parsed = parse_uniforms("uniform float custom[MISSING];", &ctx());
        let desc = parsed.registry.get("custom").unwrap();
        assert_eq!(desc.array_size, 1);
        assert_eq!(desc.value, UniformValue::Float(0.0));
    }

    #[test]
    fn test_later_define_wins() {
        let source = "#define N 2\n#define N 8\nuniform float xs[N];";
        let parsed = parse_uniforms(source, &ctx());
        assert_eq!(parsed.registry.get("xs").unwrap().array_size, 8);
    }

    #[test]
    fn test_duplicate_declaration_keeps_first_position_last_descriptor() {
        let source = "uniform float uMix;\nuniform int uOther;\nuniform vec3 uMix;";
        let parsed = parse_uniforms(source, &ctx());
        assert_eq!(parsed.ordered_names, vec!["uMix", "uOther"]);
        assert_eq!(parsed.registry.get("uMix").unwrap().glsl_type, GlslType::Vec3);
    }

    #[test]
    fn test_unknown_type_records_name_only() {
        let parsed = parse_uniforms("uniform weirdtype uThing;", &ctx());
        assert_eq!(parsed.ordered_names, vec!["uThing"]);
        assert!(parsed.registry.get("uThing").is_none());
    }

    #[test]
    fn test_ordered_names_follow_source_order() {
        let parsed = parse_uniforms(DEFAULT_FRAGMENT, &ctx());
        assert_eq!(
            parsed.ordered_names,
            vec![
                "iResolution",
                "iTime",
                "iHEG",
                "iHRV",
                "iHR",
                "iHB",
                "iFrontalAlpha1Coherence",
                "iFFT",
                "iAudio",
            ]
        );
        // define-sized spectrum arrays resolve through the symbol table
        assert_eq!(parsed.registry.get("iFFT").unwrap().array_size, 256);
    }

    #[test]
    fn test_sampler_uniform_gets_blank_texture() {
        let parsed = parse_uniforms("uniform sampler2D uTex;", &ctx());
        let desc = parsed.registry.get("uTex").unwrap();
        assert_eq!(desc.glsl_type, GlslType::Sampler);
        assert!(matches!(desc.value, UniformValue::Texture(_)));
    }
}
