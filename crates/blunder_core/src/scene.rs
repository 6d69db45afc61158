//! Scene description types.
//!
//! A [`SceneDescription`] is the renderer-agnostic result of loading a
//! scene file: plain data with materials referenced by name. The renderer
//! resolves names into handles and validates geometry when it builds its
//! own scene from this.

use blunder_math::Vec3;

/// Image and quality settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderSettings {
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// Samples per pixel
    pub samples: u32,
    /// Maximum bounce depth per path
    pub bounces: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 800,
            height: 450,
            samples: 100,
            bounces: 50,
        }
    }
}

/// Camera placement and lens.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraDescription {
    pub position: Vec3,
    pub look_at: Vec3,
    /// Vertical field of view in degrees
    pub fov: f32,
    pub up_direction: Vec3,
    /// Distance to the plane of perfect focus; defaults to the look-at distance
    pub focus_distance: Option<f32>,
    /// Defocus cone angle in degrees; 0 disables depth of field
    pub focus_angle: f32,
}

impl Default for CameraDescription {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            look_at: Vec3::new(0.0, 0.0, -1.0),
            fov: 90.0,
            up_direction: Vec3::Y,
            focus_distance: None,
            focus_angle: 0.0,
        }
    }
}

/// Surface material parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MaterialDescription {
    /// Diffuse surface (RGB, 0-1)
    Lambertian { albedo: Vec3 },
    /// Reflective surface; fuzz 0 is a perfect mirror
    Metal { albedo: Vec3, fuzz: f32 },
    /// Transparent surface with an index of refraction
    Dielectric { ior: f32 },
}

/// A material together with the name primitives refer to it by.
#[derive(Clone, Debug, PartialEq)]
pub struct NamedMaterial {
    pub name: String,
    pub material: MaterialDescription,
}

/// A sphere, optionally moving to `center_end` over the frame.
#[derive(Clone, Debug, PartialEq)]
pub struct SphereDescription {
    pub center: Vec3,
    pub center_end: Option<Vec3>,
    pub radius: f32,
    pub material: String,
    /// Source line, for error reporting
    pub line: usize,
}

/// A triangle with counter-clockwise winding.
#[derive(Clone, Debug, PartialEq)]
pub struct TriangleDescription {
    pub vertices: [Vec3; 3],
    pub material: String,
    /// Source line, for error reporting
    pub line: usize,
}

/// Everything needed to render one image.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneDescription {
    pub settings: RenderSettings,
    pub camera: CameraDescription,
    /// Materials in definition order
    pub materials: Vec<NamedMaterial>,
    pub spheres: Vec<SphereDescription>,
    pub triangles: Vec<TriangleDescription>,
}

impl SceneDescription {
    /// Look up a material by name.
    pub fn material(&self, name: &str) -> Option<&MaterialDescription> {
        self.materials
            .iter()
            .find(|m| m.name == name)
            .map(|m| &m.material)
    }

    /// Total number of primitives.
    pub fn primitive_count(&self) -> usize {
        self.spheres.len() + self.triangles.len()
    }

    /// Whether any primitive moves during the frame.
    pub fn has_motion(&self) -> bool {
        self.spheres
            .iter()
            .any(|s| s.center_end.is_some_and(|end| end != s.center))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_lookup_and_motion() {
        let mut desc = SceneDescription {
            materials: vec![NamedMaterial {
                name: "glass".into(),
                material: MaterialDescription::Dielectric { ior: 1.5 },
            }],
            spheres: vec![SphereDescription {
                center: Vec3::ZERO,
                center_end: None,
                radius: 1.0,
                material: "glass".into(),
                line: 1,
            }],
            ..Default::default()
        };

        assert_eq!(
            desc.material("glass"),
            Some(&MaterialDescription::Dielectric { ior: 1.5 })
        );
        assert_eq!(desc.material("steel"), None);
        assert_eq!(desc.primitive_count(), 1);
        assert!(!desc.has_motion());

        // An end point equal to the start is not motion
        desc.spheres[0].center_end = Some(Vec3::ZERO);
        assert!(!desc.has_motion());

        desc.spheres[0].center_end = Some(Vec3::Y);
        assert!(desc.has_motion());
    }
}
