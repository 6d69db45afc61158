//! Numeric helpers and random sampling primitives.
//!
//! All sampling functions take the generator explicitly so callers can
//! seed per worker and reproduce renders.

use crate::{GeometryError, GeometryResult, Interval, Vec3};
use rand::{Rng, RngCore};

/// Components below this magnitude are treated as zero.
pub const NEAR_ZERO: f32 = 1e-8;

/// Returns true if every component of `v` is finite.
#[inline]
pub fn is_finite_vec(v: Vec3) -> bool {
    v.is_finite()
}

/// Returns true if every component of `v` is within [`NEAR_ZERO`] of zero.
#[inline]
pub fn is_near_zero(v: Vec3) -> bool {
    v.abs().cmplt(Vec3::splat(NEAR_ZERO)).all()
}

/// Validates that a scalar is finite.
pub fn ensure_finite(what: &'static str, value: f32) -> GeometryResult<f32> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(GeometryError::NonFinite { what })
    }
}

/// Validates that a vector is finite.
pub fn ensure_finite_vec(what: &'static str, v: Vec3) -> GeometryResult<Vec3> {
    if is_finite_vec(v) {
        Ok(v)
    } else {
        Err(GeometryError::NonFinite { what })
    }
}

/// Validates that a vector is finite and not (near) zero.
pub fn ensure_direction(what: &'static str, v: Vec3) -> GeometryResult<Vec3> {
    let v = ensure_finite_vec(what, v)?;
    if is_near_zero(v) {
        return Err(GeometryError::ZeroLength { what });
    }
    Ok(v)
}

/// Validates that a scalar is finite and strictly positive.
pub fn ensure_positive(what: &'static str, value: f32) -> GeometryResult<f32> {
    let value = ensure_finite(what, value)?;
    if value <= 0.0 {
        return Err(GeometryError::NonPositive { what, value });
    }
    Ok(value)
}

/// Validates that a scalar is finite and inside the closed `range`.
pub fn ensure_in_range(what: &'static str, value: f32, range: Interval) -> GeometryResult<f32> {
    let value = ensure_finite(what, value)?;
    if !range.contains(value) {
        return Err(GeometryError::OutOfRange {
            what,
            value,
            min: range.min,
            max: range.max,
        });
    }
    Ok(value)
}

/// Validates that every component of `v` is finite and within [0, 1].
pub fn ensure_unit_range(what: &'static str, v: Vec3) -> GeometryResult<Vec3> {
    let v = ensure_finite_vec(what, v)?;
    for value in v.to_array() {
        ensure_in_range(what, value, Interval::new(0.0, 1.0))?;
    }
    Ok(v)
}

/// Uniform `f32` in [0, 1).
#[inline]
pub fn gen_f32(rng: &mut dyn RngCore) -> f32 {
    rng.gen::<f32>()
}

/// Uniform `f32` in [min, max).
#[inline]
pub fn gen_range_f32(rng: &mut dyn RngCore, min: f32, max: f32) -> f32 {
    min + (max - min) * gen_f32(rng)
}

/// Random unit vector, uniformly distributed on the unit sphere.
pub fn random_unit_vector(rng: &mut dyn RngCore) -> Vec3 {
    // Rejection sampling inside the unit ball, then project onto the sphere
    loop {
        let v = Vec3::new(
            gen_range_f32(rng, -1.0, 1.0),
            gen_range_f32(rng, -1.0, 1.0),
            gen_range_f32(rng, -1.0, 1.0),
        );
        let len_sq = v.length_squared();
        if len_sq > 1e-12 && len_sq <= 1.0 {
            return v / len_sq.sqrt();
        }
    }
}

/// Random point inside the unit disk on the XY plane (z = 0).
pub fn random_in_unit_disk(rng: &mut dyn RngCore) -> Vec3 {
    loop {
        let p = Vec3::new(
            gen_range_f32(rng, -1.0, 1.0),
            gen_range_f32(rng, -1.0, 1.0),
            0.0,
        );
        if p.length_squared() < 1.0 {
            return p;
        }
    }
}

/// Random offset in the unit square [-0.5, 0.5] x [-0.5, 0.5] (z = 0).
pub fn sample_square(rng: &mut dyn RngCore) -> Vec3 {
    Vec3::new(gen_f32(rng) - 0.5, gen_f32(rng) - 0.5, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_near_zero() {
        assert!(is_near_zero(Vec3::ZERO));
        assert!(is_near_zero(Vec3::splat(1e-9)));
        assert!(!is_near_zero(Vec3::new(0.0, 1e-3, 0.0)));
    }

    #[test]
    fn test_ensure_direction() {
        assert!(ensure_direction("dir", Vec3::X).is_ok());
        assert_eq!(
            ensure_direction("dir", Vec3::ZERO),
            Err(GeometryError::ZeroLength { what: "dir" })
        );
        assert_eq!(
            ensure_direction("dir", Vec3::new(f32::NAN, 0.0, 1.0)),
            Err(GeometryError::NonFinite { what: "dir" })
        );
    }

    #[test]
    fn test_ensure_positive() {
        assert_eq!(ensure_positive("radius", 2.0), Ok(2.0));
        assert!(matches!(
            ensure_positive("radius", 0.0),
            Err(GeometryError::NonPositive { .. })
        ));
        assert!(matches!(
            ensure_positive("radius", f32::INFINITY),
            Err(GeometryError::NonFinite { .. })
        ));
    }

    #[test]
    fn test_range_checks() {
        let unit = Interval::new(0.0, 1.0);
        assert_eq!(ensure_in_range("fuzz", 1.0, unit), Ok(1.0));
        assert!(matches!(
            ensure_in_range("fuzz", 1.5, unit),
            Err(GeometryError::OutOfRange { value, .. }) if value == 1.5
        ));
        assert!(ensure_unit_range("color", Vec3::new(0.0, 0.5, 1.0)).is_ok());
        assert!(ensure_unit_range("color", Vec3::new(0.0, -0.1, 1.0)).is_err());
        assert!(matches!(
            ensure_unit_range("color", Vec3::new(f32::NAN, 0.0, 0.0)),
            Err(GeometryError::NonFinite { .. })
        ));
    }

    #[test]
    fn test_random_unit_vector_is_normalized() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let v = random_unit_vector(&mut rng);
            assert!((v.length() - 1.0).abs() < 1e-4, "length was {}", v.length());
        }
    }

    #[test]
    fn test_random_in_unit_disk() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let p = random_in_unit_disk(&mut rng);
            assert!(p.length_squared() < 1.0);
            assert_eq!(p.z, 0.0);
        }
    }

    #[test]
    fn test_sample_square_bounds() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            let s = sample_square(&mut rng);
            assert!((-0.5..0.5).contains(&s.x));
            assert!((-0.5..0.5).contains(&s.y));
        }
    }
}
