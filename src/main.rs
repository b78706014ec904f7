use std::thread;
use std::time::Duration;

use shader_helper::{CanvasBinding, HelperConfig, MeshKind, ShaderHelper, SoundEngine, UniformValue};

// Headless demo: drive the helper the way a render loop would and dump what
// the shader slot sees.
const TICKS: usize = 10;
const FRAME_MS: u64 = 16;

fn main() {
    env_logger::init();

    let canvas = match CanvasBinding::new(800, 600) {
        Ok(canvas) => canvas,
        Err(e) => {
            eprintln!("Canvas error: {}", e);
            return;
        }
    };

    let mut helper = ShaderHelper::new(canvas, MeshKind::Plane);
    helper.set_config(HelperConfig::load());

    // Audio is optional; keep running headless when no device exists
    match SoundEngine::new() {
        Ok(audio) => helper.attach_audio(audio),
        Err(e) => log::warn!("Running without audio: {}", e),
    }

    helper.on_mouse_move(400.0, 300.0);
    helper.on_mouse_down(400.0, 300.0);

    for _ in 0..TICKS {
        helper.tick();
        thread::sleep(Duration::from_millis(FRAME_MS));
    }

    let material = helper.material(0).expect("slot 0 exists");
    println!("uniforms after {} ticks:", TICKS);
    for name in &helper.record(0).expect("slot 0 exists").ordered_uniform_names {
        match material.value(name) {
            Some(UniformValue::FloatArray(v)) => {
                println!("  {name}: [{} values]", v.len());
            }
            Some(value) => println!("  {name}: {:?}", value),
            None => println!("  {name}: (no descriptor)"),
        }
    }

    println!("\npanel controls:");
    for control in helper.panel_controls(0).expect("slot 0 exists") {
        println!(
            "  {} = {} ({}..{} step {})",
            control.label, control.value, control.min, control.max, control.step
        );
    }
}
