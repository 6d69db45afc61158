//! Scene aggregate: a material arena plus the geometry that references it.

use std::collections::HashMap;

use crate::{
    hittable::{HitRecord, Hittable, HittableList},
    material::{Dielectric, Lambertian, Material, MaterialId, Materials, Metal},
    Bvh, Primitive, Ray, RenderError, RenderResult, Sphere, Triangle,
};
use blunder_core::{MaterialDescription, SceneDescription};
use blunder_math::{Aabb, Interval};

/// Geometry container used for intersection queries.
#[derive(Debug, Clone)]
pub enum World {
    /// Linear scan, fine for a handful of objects
    List(HittableList),
    /// Bounding volume hierarchy
    Bvh(Bvh),
}

impl Hittable for World {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        match self {
            World::List(list) => list.hit(ray, ray_t),
            World::Bvh(bvh) => bvh.hit(ray, ray_t),
        }
    }

    fn bounding_box(&self) -> Aabb {
        match self {
            World::List(list) => list.bounding_box(),
            World::Bvh(bvh) => bvh.bounding_box(),
        }
    }
}

/// An immutable, fully validated scene.
///
/// Every primitive's material handle is checked against the arena when the
/// scene is assembled, so lookups during rendering cannot fail.
#[derive(Debug, Clone)]
pub struct Scene {
    materials: Materials,
    world: World,
}

impl Scene {
    /// Scene with no materials and no geometry.
    pub fn empty() -> Self {
        Self {
            materials: Materials::new(),
            world: World::List(HittableList::new()),
        }
    }

    pub fn builder() -> SceneBuilder {
        SceneBuilder::default()
    }

    /// Build a scene from a parsed description, resolving material names.
    pub fn from_description(description: &SceneDescription) -> RenderResult<Self> {
        let mut builder = Self::builder();
        let mut ids: HashMap<&str, MaterialId> = HashMap::new();

        for named in &description.materials {
            let material: Material = match named.material {
                MaterialDescription::Lambertian { albedo } => Lambertian::new(albedo)?.into(),
                MaterialDescription::Metal { albedo, fuzz } => Metal::new(albedo, fuzz)?.into(),
                MaterialDescription::Dielectric { ior } => Dielectric::new(ior)?.into(),
            };
            ids.insert(named.name.as_str(), builder.material(material));
        }

        let lookup = |name: &str| {
            ids.get(name)
                .copied()
                .ok_or_else(|| RenderError::UndefinedMaterial {
                    name: name.to_string(),
                })
        };

        for sphere in &description.spheres {
            let material = lookup(&sphere.material)?;
            let end = sphere.center_end.unwrap_or(sphere.center);
            let primitive = Sphere::moving(sphere.center, end, sphere.radius, material)
                .map_err(|source| RenderError::InvalidPrimitive {
                    line: sphere.line,
                    source,
                })?;
            builder.add(primitive);
        }

        for triangle in &description.triangles {
            let material = lookup(&triangle.material)?;
            let [a, b, c] = triangle.vertices;
            let primitive = Triangle::new(a, b, c, material).map_err(|source| {
                RenderError::InvalidPrimitive {
                    line: triangle.line,
                    source,
                }
            })?;
            builder.add(primitive);
        }

        builder.build()
    }

    pub fn materials(&self) -> &Materials {
        &self.materials
    }

    /// Material behind a handle stored in this scene's geometry.
    #[inline]
    pub fn material(&self, id: MaterialId) -> &Material {
        &self.materials[id]
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Number of primitives in the scene.
    pub fn len(&self) -> usize {
        match &self.world {
            World::List(list) => list.len(),
            World::Bvh(bvh) => bvh.primitives().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::empty()
    }
}

impl Hittable for Scene {
    #[inline]
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        self.world.hit(ray, ray_t)
    }

    fn bounding_box(&self) -> Aabb {
        self.world.bounding_box()
    }
}

/// Collects materials and primitives, then validates them into a [`Scene`].
#[derive(Debug, Clone, Default)]
pub struct SceneBuilder {
    materials: Materials,
    objects: Vec<Primitive>,
}

impl SceneBuilder {
    /// Add a material and get the handle primitives should use.
    pub fn material(&mut self, material: impl Into<Material>) -> MaterialId {
        self.materials.add(material)
    }

    /// Add a primitive.
    pub fn add(&mut self, object: impl Into<Primitive>) -> &mut Self {
        self.objects.push(object.into());
        self
    }

    /// Validate handles and build the scene with a BVH.
    pub fn build(self) -> RenderResult<Scene> {
        self.check_handles()?;
        log::info!(
            "Building BVH over {} primitives ({} materials)",
            self.objects.len(),
            self.materials.len()
        );
        Ok(Scene {
            world: World::Bvh(Bvh::new(self.objects)),
            materials: self.materials,
        })
    }

    /// Validate handles and build the scene as a flat list.
    pub fn build_list(self) -> RenderResult<Scene> {
        self.check_handles()?;
        Ok(Scene {
            world: World::List(self.objects.into_iter().collect()),
            materials: self.materials,
        })
    }

    fn check_handles(&self) -> RenderResult<()> {
        self.objects
            .iter()
            .try_for_each(|object| self.materials.check(object.material()))
    }
}
