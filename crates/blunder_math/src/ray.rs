use crate::util::{ensure_direction, ensure_finite_vec};
use crate::{GeometryError, GeometryResult, Interval, Vec3};

/// Valid range for a ray's time stamp.
const TIME_RANGE: Interval = Interval::new(0.0, 1.0);

/// A ray in 3D space with origin, direction, and time.
///
/// Rays are the currency of the renderer: a line starting at `origin`
/// and traveling along `direction`. The `time` field selects where
/// moving primitives are during the frame (motion blur).
///
/// [`Ray::new`] performs no validation and is meant for the hot path,
/// where inputs are already known to be well-formed. Anything coming
/// from outside the renderer should go through [`Ray::try_new`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    origin: Vec3,
    direction: Vec3,
    time: f32,
}

impl Ray {
    /// Create a new ray without validation.
    #[inline]
    pub fn new(origin: Vec3, direction: Vec3, time: f32) -> Self {
        Self {
            origin,
            direction,
            time,
        }
    }

    /// Create a ray at time 0 without validation.
    #[inline]
    pub fn new_simple(origin: Vec3, direction: Vec3) -> Self {
        Self::new(origin, direction, 0.0)
    }

    /// Create a validated ray.
    ///
    /// The origin must be finite, the direction finite and non-zero,
    /// and the time must lie in [0, 1].
    pub fn try_new(origin: Vec3, direction: Vec3, time: f32) -> GeometryResult<Self> {
        let mut ray = Self::default();
        ray.set_origin(origin)?;
        ray.set_direction(direction)?;
        ray.set_time(time)?;
        Ok(ray)
    }

    /// Get the origin point of the ray.
    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Get the direction vector of the ray (not necessarily normalized).
    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Get the time value of the ray.
    #[inline]
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn set_origin(&mut self, origin: Vec3) -> GeometryResult<()> {
        self.origin = ensure_finite_vec("ray origin", origin)?;
        Ok(())
    }

    pub fn set_direction(&mut self, direction: Vec3) -> GeometryResult<()> {
        self.direction = ensure_direction("ray direction", direction)?;
        Ok(())
    }

    pub fn set_time(&mut self, time: f32) -> GeometryResult<()> {
        if !time.is_finite() {
            return Err(GeometryError::NonFinite { what: "ray time" });
        }
        if !TIME_RANGE.contains(time) {
            return Err(GeometryError::OutOfRange {
                what: "ray time",
                value: time,
                min: TIME_RANGE.min,
                max: TIME_RANGE.max,
            });
        }
        self.time = time;
        Ok(())
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction. Negative `t` is allowed.
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

impl Default for Ray {
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            direction: Vec3::Z,
            time: 0.0,
        }
    }
}
