//! Mesh view types and geometry descriptors.
//!
//! The helper never tessellates anything itself; it hands these descriptors
//! to the rendering collaborator's primitive factories. Selecting a geometry
//! outside the fixed set is the one explicit validation in the core.

use std::f32::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ShaderError;

/// The fixed set of mesh types a shader slot can be projected onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeshKind {
    Plane,
    Sphere,
    Halfsphere,
    Vrscreen,
    Circle,
}

impl MeshKind {
    pub const ALL: [MeshKind; 5] = [
        MeshKind::Plane,
        MeshKind::Sphere,
        MeshKind::Vrscreen,
        MeshKind::Halfsphere,
        MeshKind::Circle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MeshKind::Plane => "plane",
            MeshKind::Sphere => "sphere",
            MeshKind::Halfsphere => "halfsphere",
            MeshKind::Vrscreen => "vrscreen",
            MeshKind::Circle => "circle",
        }
    }
}

impl fmt::Display for MeshKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MeshKind {
    type Err = ShaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plane" => Ok(MeshKind::Plane),
            "sphere" => Ok(MeshKind::Sphere),
            "halfsphere" => Ok(MeshKind::Halfsphere),
            "vrscreen" => Ok(MeshKind::Vrscreen),
            "circle" => Ok(MeshKind::Circle),
            other => Err(ShaderError::Geometry {
                requested: other.to_string(),
                options: "'plane','sphere','vrscreen','halfsphere','circle'".to_string(),
            }),
        }
    }
}

/// Parameters for the rendering collaborator's primitive factories.
///
/// The constants (segment counts, phi windows, translations) match the
/// projection each mesh kind expects from the shader's UV space.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryDescriptor {
    Plane {
        width: f32,
        height: f32,
    },
    Sphere {
        radius: f32,
        width_segments: u32,
        height_segments: u32,
        rotate_y: f32,
    },
    Halfsphere {
        radius: f32,
        phi_start: f32,
        phi_length: f32,
        theta_start: f32,
        theta_length: f32,
        translate_z: f32,
    },
    Vrscreen {
        radius: f32,
        phi_start: f32,
        phi_length: f32,
        theta_start: f32,
        theta_length: f32,
        rotate_y: f32,
        translate_z: f32,
    },
    Circle {
        radius: f32,
        segments: u32,
    },
}

/// Build the geometry descriptor for a mesh kind sized to the canvas.
pub fn create_mesh_geometry(kind: MeshKind, width: u32, height: u32) -> GeometryDescriptor {
    let w = width as f32;
    let h = height as f32;
    let radius = w.min(h);
    match kind {
        MeshKind::Plane => GeometryDescriptor::Plane {
            width: w,
            height: h,
        },
        MeshKind::Sphere => GeometryDescriptor::Sphere {
            radius,
            width_segments: 50,
            height_segments: 50,
            rotate_y: -PI * 0.5,
        },
        MeshKind::Halfsphere => GeometryDescriptor::Halfsphere {
            radius,
            phi_start: -2.0 * PI,
            phi_length: PI,
            theta_start: 0.0,
            theta_length: PI,
            translate_z: -3.0,
        },
        MeshKind::Vrscreen => GeometryDescriptor::Vrscreen {
            radius,
            phi_start: -2.0 * PI - 1.0,
            phi_length: PI + 1.0,
            theta_start: 0.5,
            theta_length: PI - 1.0,
            rotate_y: 0.5,
            translate_z: -3.0,
        },
        MeshKind::Circle => GeometryDescriptor::Circle {
            radius,
            segments: 32,
        },
    }
}

/// One shader slot's view: mesh kind, geometry parameters, and rotation.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshView {
    pub kind: MeshKind,
    pub geometry: GeometryDescriptor,
    pub rotation: [f32; 3],
}

impl MeshView {
    pub fn new(kind: MeshKind, canvas_width: u32, canvas_height: u32) -> Self {
        Self {
            kind,
            geometry: create_mesh_geometry(kind, canvas_width, canvas_height),
            // meshes face the default camera
            rotation: [0.0, PI, 0.0],
        }
    }
}
