//! Centralized shader constants and GLSL presets
//!
//! All shader-related constants are defined here once to avoid duplication
//! across the codebase.

/// Number of spectrum values fed to `iAudio` / `iFFT` each frame.
pub const SPECTRUM_LEN: usize = 256;

/// Analyzer FFT size used when filling `iAudio` (half of this many bins come out).
pub const DEFAULT_FFT_SIZE: usize = 512;

/// Sample rate reported through `iSampleRate`.
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Edge length of the zeroed placeholder texture bound to empty channels.
pub const BLANK_TEXTURE_SIZE: u32 = 512;

/// Gap (milliseconds) below which the iTimeDelta/iFrameRate clock bases are
/// not refreshed.
pub const COARSE_REFRESH_MS: f64 = 5.0;

/// Default vertex shader (standard UV passthrough)
pub const DEFAULT_VERTEX: &str = r#"
varying vec2 vUv;
void main() {
    vUv = uv;
    vec4 modelPosition = modelMatrix * vec4(position, 1.0);
    vec4 viewPosition = viewMatrix * modelPosition;
    vec4 projectedPosition = projectionMatrix * viewPosition;
    gl_Position = projectedPosition;
}
"#;

/// Default fragment shader (audio/biosignal gradient for fallback)
///
/// Declares a representative slice of the well-known uniforms, including the
/// define-sized spectrum arrays, so a freshly constructed helper exercises
/// the whole discovery path.
pub const DEFAULT_FRAGMENT: &str = r#"
#define FFTLENGTH 256
precision mediump float;
uniform vec2 iResolution;
uniform float iTime;

uniform float iHEG;
uniform float iHRV;
uniform float iHR;
uniform float iHB;
uniform float iFrontalAlpha1Coherence;
uniform float iFFT[FFTLENGTH];
uniform float iAudio[FFTLENGTH];
void main(){
    gl_FragColor = vec4(iAudio[20]/255. + iHEG*0.1+gl_FragCoord.x/gl_FragCoord.y,gl_FragCoord.y/gl_FragCoord.x,gl_FragCoord.y/gl_FragCoord.x - iHEG*0.1 - iAudio[120]/255.,1.0);
}
"#;

/// Julia-set preset fragment
pub const JULIA_FRAGMENT: &str = r#"
#define FFTLENGTH 256
precision mediump float;
varying vec2 vUv;
uniform vec2 iResolution;
uniform float iTime;
uniform float iHEG;
uniform float iHRV;
uniform float iHR;
uniform float iHB;
uniform float iFrontalAlpha1Coherence;
uniform float iFFT[FFTLENGTH];
uniform float iAudio[FFTLENGTH];

vec2 f(vec2 x, vec2 c) {
    return mat2(x,-x.y,x.x)*x + c;
}

vec3 palette(float t, vec3 a, vec3 b, vec3 c, vec3 d) {
    return a + b*cos( 6.28318*(c*t+d) );
}

void mainImage( out vec4 fragColor, in vec2 fragCoord )
{
    vec2 uv = fragCoord/iResolution.xy;
    uv -= 0.5;uv *= 1.3;uv += 0.5;
    float time = iTime*0.05+1.0;

    int u_maxIterations = 75;

    float r=0.7885*(sin((time/(3.+iHRV*0.01+iFFT[80]*0.001+iAudio[150]*0.0001+iHB))-1.57)*0.2+0.85);
    vec2 c=vec2(r*cos((time/(3.01+iHEG+iFFT[30]*0.001-iAudio[60]*0.0001+iFrontalAlpha1Coherence))),r*sin((time/3.)));

    vec2 z = vec2(0.);
    z.x = 3.0 * (uv.x - 0.5);
    z.y = 2.0 * (uv.y - 0.5);
    bool escaped = false;
    int iterations;
    for (int i = 0; i < 10000; i++) {
        if (i > u_maxIterations) break;
        iterations = i;
        z = f(z, c);
        if (dot(z,z) > 4.0) {
            escaped = true;
            break;
        }
    }

    vec3 iterationCol = vec3(palette(float(iterations)/ float(u_maxIterations),
                                    vec3(0.5),
                                    vec3(0.5),
                                    vec3(1.0, 1.0, 0.0),
                                    vec3(0.3 + 0.3 * sin(time),
                                        0.2 + 0.2 * sin(1. + time),
                                        0.2  + 0.2 * sin(1.5 + time))));

    vec3 coreCol = vec3(0.);

    float f_ite = float(iterations);
    float f_maxIte = float(u_maxIterations);
    fragColor = vec4(escaped ? iterationCol : coreCol,3.-f_ite/f_maxIte );
}

void main() {
    mainImage(gl_FragColor, vUv*iResolution);
}
"#;
