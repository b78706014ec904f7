//! Catalog of well-known uniform names.
//!
//! These names have engine-managed semantics regardless of how the shader
//! source declares them: when the parser encounters one, the catalog entry's
//! value and settings win over anything inferred from the declared GLSL
//! type. The set covers the rendering clock (time, delta, frame, framerate,
//! date, mouse), a 4-slot channel/texture bank, and the audio/biosignal
//! feeds.

use chrono::{Datelike, Local, Timelike};
use glam::{Vec2, Vec3, Vec4};

use super::registry::{UniformDescriptor, UniformSettings};
use super::value::UniformValue;
use crate::shader_constants::SPECTRUM_LEN;
use crate::texture::TextureData;

/// Uniform names the synchronizer owns outright; the settings panel never
/// exposes controls for these.
pub const ENGINE_MANAGED: [&str; 8] = [
    "iResolution",
    "iTime",
    "iDate",
    "iFrame",
    "iFrameRate",
    "iTimeDelta",
    "iMouse",
    "iMouseInput",
];

pub const WELL_KNOWN_NAMES: [&str; 35] = [
    "iResolution",
    "iTime",
    "iTimeDelta",
    "iFrame",
    "iFrameRate",
    "iChannelTime",
    "iChannelResolution",
    "iChannel0",
    "iChannel1",
    "iChannel2",
    "iChannel3",
    "iSampleRate",
    "iDate",
    "iMouse",
    "iMouseInput",
    "iImage",
    "iAudio",
    "iHRV",
    "iHEG",
    "iHR",
    "iHB",
    "iBRV",
    "iFFT",
    "iDelta",
    "iTheta",
    "iAlpha1",
    "iAlpha2",
    "iBeta",
    "iGamma",
    "iThetaBeta",
    "iAlpha1Alpha2",
    "iAlphaBeta",
    "iAlphaTheta",
    "i40Hz",
    "iFrontalAlpha1Coherence",
];

/// Wall-clock fields feeding the `iDate` vector: (years since 1900,
/// zero-based month, day of week with Sunday = 0, seconds since midnight).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DateStamp {
    pub year_offset: f32,
    pub month: f32,
    pub weekday: f32,
    pub seconds_since_midnight: f32,
}

impl DateStamp {
    pub fn now() -> Self {
        let now = Local::now();
        Self {
            year_offset: (now.year() - 1900) as f32,
            month: now.month0() as f32,
            weekday: now.weekday().num_days_from_sunday() as f32,
            seconds_since_midnight: now.num_seconds_from_midnight() as f32,
        }
    }

    pub fn to_vec4(self) -> Vec4 {
        Vec4::new(
            self.year_offset,
            self.month,
            self.weekday,
            self.seconds_since_midnight,
        )
    }
}

/// Context the catalog needs to size its defaults.
#[derive(Debug, Clone, Copy)]
pub struct CatalogContext {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub date: DateStamp,
}

impl CatalogContext {
    pub fn new(canvas_width: u32, canvas_height: u32) -> Self {
        Self {
            canvas_width,
            canvas_height,
            date: DateStamp::now(),
        }
    }
}

pub fn is_well_known(name: &str) -> bool {
    WELL_KNOWN_NAMES.contains(&name)
}

/// Catalog entry for a well-known name, or None for custom uniforms.
pub fn lookup(name: &str, ctx: &CatalogContext) -> Option<UniformDescriptor> {
    let w = ctx.canvas_width as f32;
    let h = ctx.canvas_height as f32;

    let (value, settings) = match name {
        "iResolution" => {
            let v = UniformValue::Vec2(Vec2::new(w, h));
            (v.clone(), UniformSettings::with_range(v, 8.0, 8192.0, 1.0))
        }
        "iTime" => scalar_with_range(0.0, 0.0, 999999.0, 1.0),
        "iTimeDelta" => scalar_with_range(0.0, 0.0, 2.0, 0.1),
        "iFrame" => {
            let v = UniformValue::Int(0);
            (v.clone(), UniformSettings::with_range(v, 0.0, 999999.0, 1.0))
        }
        "iFrameRate" => scalar_with_range(0.0, 0.0, 144.0, 1.0),
        "iChannelTime" => {
            let v = UniformValue::FloatArray(vec![0.0; 4]);
            (v.clone(), UniformSettings::with_range(v, 0.0, 99999.0, 1.0))
        }
        "iChannelResolution" => {
            let v = UniformValue::Vec3Array(vec![Vec3::new(100.0, 100.0, 0.0); 4]);
            (v.clone(), UniformSettings::with_range(v, 8.0, 8192.0, 1.0))
        }
        "iChannel0" | "iChannel1" | "iChannel2" | "iChannel3" => {
            let v = UniformValue::Texture(TextureData::blank_default());
            (v.clone(), UniformSettings::new(v))
        }
        "iSampleRate" => scalar_with_range(44100.0, 8000.0, 96000.0, 1000.0),
        "iDate" => {
            let v = UniformValue::Vec4(ctx.date.to_vec4());
            (v.clone(), UniformSettings::new(v))
        }
        "iMouse" => {
            let v = UniformValue::Vec4(Vec4::ZERO);
            (v.clone(), UniformSettings::with_range(v, 0.0, 8192.0, 1.0))
        }
        // the click flag is written as 0.0/1.0, so it lives as a float
        "iMouseInput" => {
            let v = UniformValue::Float(0.0);
            (v.clone(), UniformSettings::new(v))
        }
        "iImage" => {
            let v = UniformValue::Texture(TextureData::blank(ctx.canvas_width, ctx.canvas_height));
            (v.clone(), UniformSettings::new(v))
        }
        "iAudio" => {
            let v = UniformValue::FloatArray(vec![0.0; SPECTRUM_LEN]);
            (v.clone(), UniformSettings::with_range(v, 0.0, 255.0, 1.0))
        }
        "iFFT" => {
            let v = UniformValue::FloatArray(vec![0.0; SPECTRUM_LEN]);
            let mut s = UniformSettings::new(v.clone());
            s.min = Some(0.0);
            s.max = Some(1000.0);
            (v, s)
        }
        "iHRV" => scalar_with_range(0.0, 0.0, 40.0, 0.5),
        "iHEG" => scalar_with_range(0.0, -3.0, 3.0, 0.1),
        "iHR" => scalar_with_range(0.0, 0.0, 240.0, 1.0),
        "iHB" => scalar_with_range(0.0, 0.0, 1.0, 0.1),
        "iBRV" => scalar_with_range(0.0, 0.0, 10.0, 0.5),
        "iDelta" | "iTheta" | "iAlpha1" | "iAlpha2" | "iBeta" | "iGamma" => {
            scalar_with_range(0.0, 0.0, 100.0, 0.5)
        }
        "iThetaBeta" | "iAlpha1Alpha2" | "iAlphaBeta" | "iAlphaTheta" => {
            scalar_with_range(0.0, 0.0, 5.0, 0.1)
        }
        "i40Hz" => scalar_with_range(0.0, 0.0, 10.0, 0.1),
        "iFrontalAlpha1Coherence" => scalar_with_range(0.0, 0.0, 1.1, 0.1),
        _ => return None,
    };

    Some(UniformDescriptor::new(
        value.glsl_type(),
        value.array_len(),
        value,
        settings,
    ))
}

fn scalar_with_range(default: f32, min: f64, max: f64, step: f64) -> (UniformValue, UniformSettings) {
    let v = UniformValue::Float(default);
    (v.clone(), UniformSettings::with_range(v, min, max, step))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> CatalogContext {
        CatalogContext {
            canvas_width: 640,
            canvas_height: 480,
            date: DateStamp::default(),
        }
    }

    #[test]
    fn test_every_well_known_name_has_an_entry() {
        for name in WELL_KNOWN_NAMES {
            assert!(lookup(name, &ctx()).is_some(), "missing entry for {name}");
        }
    }

    #[test]
    fn test_heg_range_matches_biosignal_contract() {
        let desc = lookup("iHEG", &ctx()).unwrap();
        assert_eq!(desc.value, UniformValue::Float(0.0));
        assert_eq!(desc.settings.min, Some(-3.0));
        assert_eq!(desc.settings.max, Some(3.0));
        assert_eq!(desc.settings.step, Some(0.1));
    }

    #[test]
    fn test_resolution_defaults_to_canvas_size() {
        let desc = lookup("iResolution", &ctx()).unwrap();
        assert_eq!(desc.value, UniformValue::Vec2(Vec2::new(640.0, 480.0)));
    }

    #[test]
    fn test_spectrum_feeds_are_sized() {
        for name in ["iAudio", "iFFT"] {
            let desc = lookup(name, &ctx()).unwrap();
            assert_eq!(desc.array_size, SPECTRUM_LEN);
        }
    }

    #[test]
    fn test_fft_has_no_step() {
        let desc = lookup("iFFT", &ctx()).unwrap();
        assert_eq!(desc.settings.step, None);
    }

    #[test]
    fn test_engine_managed_is_subset_of_catalog() {
        for name in ENGINE_MANAGED {
            assert!(is_well_known(name));
        }
    }

    #[test]
    fn test_custom_names_miss() {
        assert!(lookup("uCustomThing", &ctx()).is_none());
    }
}
