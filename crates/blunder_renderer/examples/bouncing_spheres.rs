//! Renders a field of small spheres around three large ones.
//!
//! Diffuse spheres bounce upward during the frame, so the render also
//! exercises motion blur and depth of field.
//!
//! ```text
//! cargo run --release -p blunder_renderer --example bouncing_spheres
//! ```

use blunder_renderer::{
    render, Camera, Color, Dielectric, Lambertian, Metal, RenderConfig, Scene, Sphere, Vec3,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let scene = build_scene()?;

    let camera = Camera::new()
        .with_position(Vec3::new(13.0, 2.0, 3.0), Vec3::ZERO, Vec3::Y)?
        .with_fov(20.0)?
        .with_defocus(0.6, Some(10.0))?
        .with_motion_blur(true);

    let config = RenderConfig::new(800, 450, 50, 10)?.with_seed(7);
    let image = render(&scene, &camera, &config)?;
    image.save("bouncing_spheres.png")?;

    Ok(())
}

fn build_scene() -> anyhow::Result<Scene> {
    let mut builder = Scene::builder();
    let mut rng = StdRng::seed_from_u64(2024);

    let ground = builder.material(Lambertian::new(Color::splat(0.5))?);
    builder.add(Sphere::new(Vec3::new(0.0, -1000.0, 0.0), 1000.0, ground)?);

    let glass = builder.material(Dielectric::new(1.5)?);
    let brown = builder.material(Lambertian::new(Color::new(0.4, 0.2, 0.1))?);
    let mirror = builder.material(Metal::new(Color::new(0.7, 0.6, 0.5), 0.0)?);
    builder
        .add(Sphere::new(Vec3::new(0.0, 1.0, 0.0), 1.0, glass)?)
        .add(Sphere::new(Vec3::new(-4.0, 1.0, 0.0), 1.0, brown)?)
        .add(Sphere::new(Vec3::new(4.0, 1.0, 0.0), 1.0, mirror)?);

    for a in -11..11 {
        for b in -11..11 {
            let center = Vec3::new(
                a as f32 + 0.9 * rng.gen::<f32>(),
                0.2,
                b as f32 + 0.9 * rng.gen::<f32>(),
            );
            if (center - Vec3::new(4.0, 0.2, 0.0)).length() <= 0.9 {
                continue;
            }

            let choose_mat: f32 = rng.gen();
            if choose_mat < 0.8 {
                // Diffuse, bouncing
                let albedo = Color::new(
                    rng.gen::<f32>() * rng.gen::<f32>(),
                    rng.gen::<f32>() * rng.gen::<f32>(),
                    rng.gen::<f32>() * rng.gen::<f32>(),
                );
                let material = builder.material(Lambertian::new(albedo)?);
                let end = center + Vec3::new(0.0, rng.gen_range(0.0..0.5), 0.0);
                builder.add(Sphere::moving(center, end, 0.2, material)?);
            } else if choose_mat < 0.95 {
                // Metal
                let albedo = Color::new(
                    rng.gen_range(0.5..1.0),
                    rng.gen_range(0.5..1.0),
                    rng.gen_range(0.5..1.0),
                );
                let material = builder.material(Metal::new(albedo, rng.gen_range(0.0..0.5))?);
                builder.add(Sphere::new(center, 0.2, material)?);
            } else {
                builder.add(Sphere::new(center, 0.2, glass)?);
            }
        }
    }

    Ok(builder.build()?)
}
