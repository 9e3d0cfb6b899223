use super::*;

/// A (D-1)-simplex in D-dimensional (euclidean) space
/// (A line segment in 2D space, a triangle in 3D space, etc...)
#[derive(Clone, Debug, PartialEq)]
pub struct Simplex<const D: usize> {
    /// The first vertex, followed by the edges starting from it
    plane: HyperPlaneBasis<D>,
    /// The same plane, but represented with an orthonormal basis, useful for orthogonal symmetries
    orthonormalised: HyperPlaneBasisOrtho<D>,
}

pub type Triangle = Simplex<3>;
pub type LineSegment = Simplex<2>;

impl<const D: usize> Simplex<D> {
    /// Returns `None` if the vertices are affinely dependent (a flat triangle, for example).
    #[inline]
    pub fn try_new(vertices: [impl Into<SVector<Float, D>>; D]) -> Option<Self> {
        let mut vectors: [SVector<Float, D>; D] = vertices.map(Into::into);
        let (&mut v0, edges) = vectors.split_first_mut()?;
        edges.iter_mut().for_each(|v| *v -= v0);

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
    pub fn vertices(&self) -> [SVector<Float, D>; D] {
        let mut vertices = *self.plane.vectors_raw();
        if let Some((&mut v0, edges)) = vertices.split_first_mut() {
            edges.iter_mut().for_each(|v| *v += v0);
        }
        vertices
    }
}

impl<const D: usize> Mirror<D> for Simplex<D> {
    fn add_tangents(&self, ctx: &mut SimulationCtx<D>) {
        let p = self.inner_plane();

        let Some(coords) = p.intersection_coordinates(ctx.ray(), p.v0()) else {
            return;
        };

        let [t, barycentric @ ..] = coords.as_slice() else {
            return;
        };

        if barycentric.iter().all(|&c| c >= 0.0) && barycentric.iter().sum::<Float>() <= 1.0 {
            ctx.add_tangent(Plane {
                intersection: Intersection::Distance(*t),
                direction: HyperPlane::Plane(self.orthonormalised.clone()),
            });
        }
    }
}

impl<const D: usize> JsonType for Simplex<D> {
    fn json_type() -> String {
        "simplex".into()
    }
}

impl<const D: usize> JsonDes for Simplex<D> {
    /// ```json
    /// {
    ///     "vertices": [         // D vectors of D floats, affinely independent
    ///         [1., 2., 3., ...],
    ///         ...
    ///     ]
    /// }
    /// ```
    fn from_json(json: &serde_json::Value) -> JsonResult<Self> {
        let mut vertices = [SVector::zeros(); D];
        read_vectors(json, "vertices", &mut vertices)?;

        Self::try_new(vertices)
            .ok_or_else(|| JsonError::invalid("vertices", "the simplex must not be flat"))
    }
}

impl<const D: usize> JsonSer for Simplex<D> {
    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "vertices": Vec::from_iter(self.vertices().iter().map(SVector::as_slice)),
        })
    }
}

impl<const D: usize> Random for Simplex<D> {
    fn random(rng: &mut (impl rand::Rng + ?Sized)) -> Self {
        loop {
            let center: SVector<Float, D> = rand_vect(rng, MAX_MIRROR_COORD);
            let vertices: [SVector<Float, D>; D] =
                core::array::from_fn(|_| center + rand_vect(rng, MAX_MIRROR_COORD / 2.0));

            if let Some(simplex) = Self::try_new(vertices) {
                break simplex;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beam::nalgebra::{Vector2, Vector3};
    use serde_json::json;

    fn triangle() -> Triangle {
        Simplex::try_new([[0., 0., 0.], [1., 0., 0.], [0., 0., 1.]]).unwrap()
    }

    fn closest<const D: usize>(mirror: &Simplex<D>, ray: Ray<D>) -> Option<Float> {
        let mut ctx = SimulationCtx::new(ray, DEFAULT_EPS);
        mirror.add_tangents(&mut ctx);
        ctx.closest_distance()
    }

    #[test]
    fn test_triangle_bounds() {
        let down = Vector3::new(0., -1., 0.);

        let inside = Ray::new_normalize([0.2, 2., 0.2], down);
        assert!((closest(&triangle(), inside).unwrap() - 2.).abs() < 1e-12);

        // inside the bounding square, outside the triangle
        let outside = Ray::new_normalize([0.7, 2., 0.7], down);
        assert_eq!(closest(&triangle(), outside), None);

        let negative = Ray::new_normalize([-0.1, 2., 0.2], down);
        assert_eq!(closest(&triangle(), negative), None);
    }

    #[test]
    fn test_line_segment() {
        let segment = LineSegment::try_new([[-1., 0.], [1., 0.]]).unwrap();

        let hit = Ray::new_normalize([0.5, 1.], [0., -1.]);
        assert!((closest(&segment, hit).unwrap() - 1.).abs() < 1e-12);

        let miss = Ray::new_normalize([1.5, 1.], [0., -1.]);
        assert_eq!(closest(&segment, miss), None);

        assert!(LineSegment::try_new([Vector2::new(1., 1.), Vector2::new(1., 1.)]).is_none());
    }

    #[test]
    fn test_vertices_and_json() {
        let t = triangle();
        assert_eq!(t.vertices()[1], Vector3::new(1., 0., 0.));

        let json = t.to_json();
        assert_eq!(json, json!({"vertices": [[0., 0., 0.], [1., 0., 0.], [0., 0., 1.]]}));
        assert_eq!(Triangle::from_json(&json).unwrap(), t);

        let flat = json!({"vertices": [[0., 0., 0.], [1., 0., 0.], [2., 0., 0.]]});
        assert!(Triangle::from_json(&flat).is_err());
    }
}
