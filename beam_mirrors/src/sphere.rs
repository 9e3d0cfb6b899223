use super::*;

/// All points at a certain distance (`radius`) from a certain vector (`center`)
/// where the distance here is the standard euclidean distance
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Sphere<const D: usize> {
    center: SVector<Float, D>,
    radius: Float,
}

impl<const D: usize> Sphere<D> {
    /// Returns `None` if `radius` is zero or if any coordinate is not finite.
    #[inline]
    pub fn try_new(center: impl Into<SVector<Float, D>>, radius: Float) -> Option<Self> {
        let center = center.into();

        (radius.is_normal() && center.iter().all(|c| c.is_finite())).then_some(Self {
            center,
            radius: radius.abs(),
        })
    }

    #[inline]
    pub fn center(&self) -> &SVector<Float, D> {
        &self.center
    }

    #[inline]
    pub fn radius(&self) -> Float {
        self.radius
    }

    /// The distances along `ray` at which it crosses the sphere, in ascending order.
    pub fn intersections(&self, ray: &Ray<D>) -> Option<[Float; 2]> {
        // substituting `V` for `P + t * D` in the sphere equation:
        // `||V - C||^2 = r^2` results in a quadratic equation in `t`.

        let v = ray.origin - self.center;
        let r = self.radius;

        let b = v.dot(ray.direction.as_ref());
        let c = r.mul_add(-r, v.norm_squared());

        let delta = b.mul_add(b, -c);

        (delta >= 0.0).then(|| {
            let root = delta.sqrt();
            [-b - root, -b + root]
        })
    }

    /// The outward unit normal at `p`, assumed to lie on (or very near) the sphere.
    #[inline]
    pub fn normal_at(&self, p: &SVector<Float, D>) -> Unit<SVector<Float, D>> {
        Unit::new_normalize(p - self.center)
    }
}

impl<const D: usize> Mirror<D> for Sphere<D> {
    fn add_tangents(&self, ctx: &mut SimulationCtx<D>) {
        let ray = *ctx.ray();
        // hit points drift off the sphere in proportion to its size
        let min_dist = ctx.eps() * self.radius.max(1.0);

        for t in self.intersections(&ray).into_iter().flatten() {
            if t <= min_dist {
                continue;
            }

            ctx.add_tangent(Plane {
                intersection: Intersection::Distance(t),
                direction: HyperPlane::Normal(self.normal_at(&ray.at(t))),
            });
        }
    }
}

impl<const D: usize> JsonType for Sphere<D> {
    fn json_type() -> String {
        "sphere".into()
    }
}

impl<const D: usize> JsonDes for Sphere<D> {
    /// ```json
    /// {
    ///     "center": [1., 2., 3., ...], // D floats
    ///     "radius": 4.                 // must not be zero
    /// }
    /// ```
    fn from_json(json: &serde_json::Value) -> JsonResult<Self> {
        let center = get_vector(json, "center")?;
        let radius = get_float(json, "radius")?;

        Self::try_new(center, radius)
            .ok_or_else(|| JsonError::invalid("radius", "must be finite and non-zero"))
    }
}

impl<const D: usize> JsonSer for Sphere<D> {
    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "center": self.center.as_slice(),
            "radius": self.radius,
        })
    }
}

impl<const D: usize> Random for Sphere<D> {
    fn random(rng: &mut (impl rand::Rng + ?Sized)) -> Self {
        Self {
            center: rand_vect(rng, MAX_MIRROR_COORD),
            radius: rng.gen_range(0.5..MAX_MIRROR_COORD / 2.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beam::nalgebra::Vector2;
    use serde_json::json;

    #[test]
    fn test_intersections() {
        let circle = Sphere::<2>::try_new([0., 0.], 1.).unwrap();

        let through = Ray::new_normalize([0., 5.], [0., -1.]);
        let [near, far] = circle.intersections(&through).unwrap();
        assert!((near - 4.).abs() < 1e-12);
        assert!((far - 6.).abs() < 1e-12);

        let miss = Ray::new_normalize([2., 5.], [0., -1.]);
        assert!(circle.intersections(&miss).is_none());
    }

    #[test]
    fn test_closest_tangent() {
        let circle = Sphere::<2>::try_new([0., 0.], 1.).unwrap();

        let outside = Ray::new_normalize([0., 5.], [0., -1.]);
        let mut ctx = SimulationCtx::new(outside, DEFAULT_EPS);
        circle.add_tangents(&mut ctx);
        assert!((ctx.closest_distance().unwrap() - 4.).abs() < 1e-12);

        // from the inside, only the far side is in front of the ray
        let inside = Ray::new_normalize([0., 0.5], [0., -1.]);
        let mut ctx = SimulationCtx::new(inside, DEFAULT_EPS);
        circle.add_tangents(&mut ctx);
        assert!((ctx.closest_distance().unwrap() - 1.5).abs() < 1e-12);

        let n = circle.normal_at(&Vector2::new(0., 1.));
        assert!((n.into_inner() - Vector2::y()).norm() < 1e-12);

        // slightly off the circle, the normal is still unit length
        let n = circle.normal_at(&Vector2::new(0., 1. + 1e-7));
        assert!((n.norm() - 1.).abs() < 1e-15);
    }

    #[test]
    fn test_starting_point_is_ignored() {
        let circle = Sphere::<2>::try_new([0., 0.], 1.).unwrap();

        // starts a hair off the circle, as a reflected ray does
        let start = Vector2::new(0.6, 0.8) * (1. + 2e-14);
        let ray = Ray::new_normalize(start, [-1., 0.]);
        let mut ctx = SimulationCtx::new(ray, DEFAULT_EPS);
        circle.add_tangents(&mut ctx);

        assert!((ctx.closest_distance().unwrap() - 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_closed_circle_traps_every_ray() {
        let circle = Sphere::<2>::try_new([0., 0.], 1.).unwrap();
        let mut reflector = Reflector::<2>::new(
            ReflectorParams {
                bounce_limit: 60,
                far: 1000.,
                ..Default::default()
            },
            64,
        );

        let mut directions = vec![Vector2::new(1., 0.37)];
        directions.extend((0..500).map(|i| {
            let angle = i as Float * core::f64::consts::TAU / 500.;
            Vector2::new(angle.cos(), angle.sin())
        }));

        for dir in directions {
            let mut hits = vec![];
            let termination = reflector.cast(&circle, [0.1, 0.], dir, |hit, _| hits.push(*hit));

            assert_eq!(termination, Termination::BounceLimit, "direction {dir:?}");
            assert_eq!(hits.len(), 60);

            for hit in &hits {
                assert!((hit.normal.norm() - 1.).abs() < 1e-12);
                assert!((hit.direction.norm() - 1.).abs() < 1e-12);
                assert!((hit.position.norm() - 1.).abs() < 1e-9);
            }

        }
    }

    #[test]
    fn test_json() {
        let sphere = Sphere::<3>::try_new([1., 2., 3.], 0.5).unwrap();
        assert_eq!(Sphere::<3>::from_json(&sphere.to_json()).unwrap(), sphere);

        assert!(Sphere::<3>::from_json(&json!({"center": [0., 0., 0.], "radius": 0.})).is_err());
        assert!(matches!(
            Sphere::<3>::from_json(&json!({"center": [0., 0., 0.]})),
            Err(JsonError::Missing("radius"))
        ));
    }
}
