use super::*;

/// A parallelotope-shaped reflective (hyper)plane: all points `v0 + sum mu_k * v_k`
/// with every `|mu_k| < 1`. (A line segment in 2D, a parallelogram in 3D, etc...)
#[derive(Clone, Debug, PartialEq)]
pub struct PlaneMirror<const D: usize> {
    /// The center followed by the `D - 1` half-spans
    plane: HyperPlaneBasis<D>,
    /// The same plane, but represented with an orthonormal basis, useful for orthogonal symmetries
    orthonormalised: HyperPlaneBasisOrtho<D>,
}

impl<const D: usize> PlaneMirror<D> {
    /// `vectors[0]` is the center, the others must form a free family.
    #[inline]
    pub fn try_new(vectors: [SVector<Float, D>; D]) -> Option<Self> {
        HyperPlaneBasis::new(vectors).map(|(plane, orthonormalised)| Self {
            plane,
            orthonormalised,
        })
    }

    #[inline]
    pub fn inner_plane(&self) -> &HyperPlaneBasis<D> {
        &self.plane
    }

    #[inline]
    pub fn center(&self) -> &SVector<Float, D> {
        self.plane.v0()
    }
}

impl<const D: usize> Mirror<D> for PlaneMirror<D> {
    fn add_tangents(&self, ctx: &mut SimulationCtx<D>) {
        let p = self.inner_plane();

        let Some(coords) = p.intersection_coordinates(ctx.ray(), p.v0()) else {
            return;
        };

        let [t, plane_coords @ ..] = coords.as_slice() else {
            return;
        };

        if plane_coords.iter().all(|mu| mu.abs() < 1.0) {
            ctx.add_tangent(Plane {
                // `t` is already known, spare the context from computing it again
                intersection: Intersection::Distance(*t),
                direction: HyperPlane::Plane(self.orthonormalised.clone()),
            });
        }
    }
}

impl<const D: usize> JsonType for PlaneMirror<D> {
    fn json_type() -> String {
        "plane".into()
    }
}

impl<const D: usize> JsonDes for PlaneMirror<D> {
    /// Deserialize a new plane mirror from a JSON object.
    ///
    /// ```json
    /// {
    ///     "center": [1., 2., 3., ...],  // D floats
    ///     "basis": [                    // D - 1 vectors of D floats, linearly independent
    ///         [4., 5., 6., ...],
    ///         ...
    ///     ]
    /// }
    /// ```
    fn from_json(json: &serde_json::Value) -> JsonResult<Self> {
        let mut vectors = [SVector::zeros(); D];

        vectors[0] = get_vector(json, "center")?;
        read_vectors(json, "basis", &mut vectors[1..])?;

        Self::try_new(vectors)
            .ok_or_else(|| JsonError::invalid("basis", "the vectors must be linearly independent"))
    }
}

impl<const D: usize> JsonSer for PlaneMirror<D> {
    /// The format of the returned object is explained in [`Self::from_json`]
    fn to_json(&self) -> serde_json::Value {
        let p = self.inner_plane();

        serde_json::json!({
            "center": p.v0().as_slice(),
            "basis": Vec::from_iter(p.basis().iter().map(SVector::as_slice)),
        })
    }
}

impl<const D: usize> Random for PlaneMirror<D> {
    fn random(rng: &mut (impl rand::Rng + ?Sized)) -> Self {
        let center = rand_vect(rng, MAX_MIRROR_COORD);

        loop {
            let mut vectors = [center; D];
            for v in &mut vectors[1..] {
                *v = rand_vect(rng, MAX_MIRROR_COORD / 2.0);
            }

            if let Some(mirror) = Self::try_new(vectors) {
                break mirror;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beam::nalgebra::Vector3;
    use serde_json::json;

    fn floor() -> PlaneMirror<3> {
        PlaneMirror::try_new([
            Vector3::zeros(),
            Vector3::new(2., 0., 0.),
            Vector3::new(0., 0., 2.),
        ])
        .unwrap()
    }

    fn closest(mirror: &PlaneMirror<3>, ray: Ray<3>) -> Option<Float> {
        let mut ctx = SimulationCtx::new(ray, DEFAULT_EPS);
        mirror.add_tangents(&mut ctx);
        ctx.closest_distance()
    }

    #[test]
    fn test_hits_inside_bounds_only() {
        let down = Vector3::new(0., -1., 0.);

        let inside = Ray::new_normalize([1.5, 3., -1.5], down);
        assert!((closest(&floor(), inside).unwrap() - 3.).abs() < 1e-12);

        let outside = Ray::new_normalize([2.5, 3., 0.], down);
        assert_eq!(closest(&floor(), outside), None);

        let behind = Ray::new_normalize([0., -3., 0.], down);
        assert_eq!(closest(&floor(), behind), None);
    }

    #[test]
    fn test_parallel_ray_misses() {
        let ray = Ray::new_normalize([0., 1., 0.], [1., 0., 0.]);
        assert_eq!(closest(&floor(), ray), None);
    }

    #[test]
    fn test_json() {
        let json = json!({
            "center": [0., 0., 0.],
            "basis": [[2., 0., 0.], [0., 0., 2.]],
        });

        let mirror = PlaneMirror::<3>::from_json(&json).unwrap();
        assert_eq!(mirror, floor());
        assert_eq!(mirror.to_json(), json);

        let flat = json!({"center": [0., 0., 0.], "basis": [[1., 0., 0.], [2., 0., 0.]]});
        assert!(matches!(
            PlaneMirror::<3>::from_json(&flat),
            Err(JsonError::Invalid { field: "basis", .. })
        ));

        let short = json!({"center": [0., 0., 0.], "basis": [[1., 0., 0.]]});
        assert!(PlaneMirror::<3>::from_json(&short).is_err());
    }
}
