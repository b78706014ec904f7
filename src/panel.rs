//! Settings-panel metadata.
//!
//! The helper never builds widgets; it hands the GUI collaborator a flat
//! list of control descriptors and takes values back through
//! [`crate::helper::ShaderHelper::set_uniform_component`]. Engine-managed
//! uniforms are omitted (the synchronizer overwrites them every tick), as
//! are textures and the long data-feed arrays.

use crate::material::ShaderMaterial;
use crate::uniforms::catalog::ENGINE_MANAGED;
use crate::uniforms::registry::UniformRegistry;

const COMPONENT_LABELS: [&str; 4] = ["x", "y", "z", "w"];

/// One tunable scalar the panel should render as a slider.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformControl {
    pub name: String,
    /// Component index for vector/matrix uniforms; None for scalars.
    pub component: Option<usize>,
    pub label: String,
    pub value: f64,
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

/// Build the control list for one slot, in the shader's declaration order.
///
/// A uniform yields controls only when its settings carry a full
/// min/max/step range; composite values split into one control per
/// component.
pub fn panel_controls(
    ordered_names: &[String],
    material: &ShaderMaterial,
    registry: &UniformRegistry,
) -> Vec<UniformControl> {
    let mut controls = Vec::new();

    for name in ordered_names {
        if ENGINE_MANAGED.contains(&name.as_str()) {
            continue;
        }
        let Some(desc) = registry.get(name) else {
            continue;
        };
        let (Some(min), Some(max), Some(step)) =
            (desc.settings.min, desc.settings.max, desc.settings.step)
        else {
            continue;
        };

        // panel edits act on the live material value when present
        let value = material.value(name).unwrap_or(&desc.value);
        let components = value.component_count();

        match components {
            0 => {}
            1 => controls.push(UniformControl {
                name: name.clone(),
                component: None,
                label: name.clone(),
                value: value.component(0).unwrap_or(0.0),
                min,
                max,
                step,
            }),
            n => {
                for i in 0..n {
                    let label = match COMPONENT_LABELS.get(i) {
                        Some(axis) if n <= 4 => format!("{name}.{axis}"),
                        _ => format!("{name}[{i}]"),
                    };
                    controls.push(UniformControl {
                        name: name.clone(),
                        component: Some(i),
                        label,
                        value: value.component(i).unwrap_or(0.0),
                        min,
                        max,
                        step,
                    });
                }
            }
        }
    }

    controls
}
