use super::*;

use arrayvec::ArrayVec;
use beam::nalgebra::{Rotation3, Vector3};

/// An oriented box: all points `center + sum x_k * axes[k]` with every `|x_k| <= half_extents[k]`.
///
/// A rectangle in 2D, a rectangular cuboid in 3D.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cuboid<const D: usize> {
    center: SVector<Float, D>,
    half_extents: SVector<Float, D>,
    /// Orthonormal columns, the box's local axes
    axes: SMatrix<Float, D, D>,
}

/// Where a ray crosses a face of a [`Cuboid`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceHit {
    pub distance: Float,
    /// Index of the local axis the face is orthogonal to.
    pub axis: usize,
}

impl<const D: usize> Cuboid<D> {
    /// Returns `None` if an extent isn't strictly positive, if `axes` isn't
    /// orthonormal, or if any value isn't finite.
    pub fn try_new(
        center: impl Into<SVector<Float, D>>,
        half_extents: impl Into<SVector<Float, D>>,
        axes: SMatrix<Float, D, D>,
    ) -> Option<Self> {
        const TOLERANCE: Float = 1e-9;

        let center = center.into();
        let half_extents = half_extents.into();

        let finite = center.iter().chain(axes.iter()).all(|c| c.is_finite());
        let positive = half_extents.iter().all(|e| e.is_finite() && *e > 0.0);
        let orthonormal = (axes.tr_mul(&axes) - SMatrix::identity()).amax() < TOLERANCE;

        (finite && positive && orthonormal).then_some(Self {
            center,
            half_extents,
            axes,
        })
    }

    /// A box aligned with the standard basis.
    #[inline]
    pub fn axis_aligned(
        center: impl Into<SVector<Float, D>>,
        half_extents: impl Into<SVector<Float, D>>,
    ) -> Option<Self> {
        Self::try_new(center, half_extents, SMatrix::identity())
    }

    #[inline]
    pub fn center(&self) -> &SVector<Float, D> {
        &self.center
    }

    #[inline]
    pub fn half_extents(&self) -> &SVector<Float, D> {
        &self.half_extents
    }

    #[inline]
    pub fn axes(&self) -> &SMatrix<Float, D, D> {
        &self.axes
    }

    /// Coordinates of `p` in the box's local frame.
    #[inline]
    pub fn to_local(&self, p: &SVector<Float, D>) -> SVector<Float, D> {
        self.axes.tr_mul(&(p - self.center))
    }

    #[inline]
    pub fn contains(&self, p: &SVector<Float, D>) -> bool {
        self.to_local(p)
            .iter()
            .zip(self.half_extents.iter())
            .all(|(x, e)| x.abs() <= *e)
    }

    /// Where `ray`'s supporting line enters and leaves the box, in that order.
    ///
    /// Distances can be negative, if the box is (partly) behind the ray.
    pub fn intersections(&self, ray: &Ray<D>) -> Option<[FaceHit; 2]> {
        let origin = self.to_local(&ray.origin);
        let dir = self.axes.tr_mul(ray.direction.as_ref());

        let mut enter = FaceHit {
            distance: Float::NEG_INFINITY,
            axis: 0,
        };
        let mut exit = FaceHit {
            distance: Float::INFINITY,
            axis: 0,
        };

        for axis in 0..D {
            let (o, d, e) = (origin[axis], dir[axis], self.half_extents[axis]);

            if d.abs() <= Float::EPSILON {
                // parallel to this slab
                if o.abs() > e {
                    return None;
                }
                continue;
            }

            let (t0, t1) = ((-e - o) / d, (e - o) / d);
            let (near, far) = if t0 <= t1 { (t0, t1) } else { (t1, t0) };

            if near > enter.distance {
                enter = FaceHit {
                    distance: near,
                    axis,
                };
            }

            if far < exit.distance {
                exit = FaceHit {
                    distance: far,
                    axis,
                };
            }
        }

        (enter.distance <= exit.distance && enter.distance.is_finite()).then_some([enter, exit])
    }

    /// The face's plane direction, as a unit normal.
    #[inline]
    pub fn face_normal(&self, axis: usize) -> Unit<SVector<Float, D>> {
        // the columns of `axes` are unit vectors
        Unit::new_unchecked(self.axes.column(axis).into_owned())
    }
}

impl Cuboid<3> {
    /// `rotation` holds euler angles, applied about the X, then Y, then Z axis of the
    /// box's own frame: `R = Rx * Ry * Rz`.
    pub fn from_euler_xyz(
        center: impl Into<Vector3<Float>>,
        half_extents: impl Into<Vector3<Float>>,
        [x, y, z]: [Float; 3],
    ) -> Option<Self> {
        let rotation = Rotation3::from_axis_angle(&Vector3::x_axis(), x)
            * Rotation3::from_axis_angle(&Vector3::y_axis(), y)
            * Rotation3::from_axis_angle(&Vector3::z_axis(), z);

        Self::try_new(center, half_extents, rotation.into_inner())
    }
}

impl<const D: usize> Mirror<D> for Cuboid<D> {
    fn add_tangents(&self, ctx: &mut SimulationCtx<D>) {
        let Some(faces) = self.intersections(ctx.ray()) else {
            return;
        };

        // a grazing ray enters and leaves through the same point
        let faces: ArrayVec<FaceHit, 2> = if faces[0] == faces[1] {
            faces[..1].iter().copied().collect()
        } else {
            faces.into()
        };

        for FaceHit { distance, axis } in faces {
            ctx.add_tangent(Plane {
                intersection: Intersection::Distance(distance),
                direction: HyperPlane::Normal(self.face_normal(axis)),
            });
        }
    }
}

impl<const D: usize> JsonType for Cuboid<D> {
    fn json_type() -> String {
        "cuboid".into()
    }
}

impl<const D: usize> JsonDes for Cuboid<D> {
    /// ```json
    /// {
    ///     "center": [1., 2., 3., ...],        // D floats
    ///     "half_extents": [1., 0.5, 0.5, ...], // D positive floats
    ///     "axes": [[1., 0., 0., ...], ...]     // optional, D orthonormal vectors
    /// }
    /// ```
    fn from_json(json: &serde_json::Value) -> JsonResult<Self> {
        let center = get_vector(json, "center")?;
        let half_extents = get_vector(json, "half_extents")?;

        let axes = if json.get("axes").is_some() {
            let mut columns = [SVector::zeros(); D];
            read_vectors(json, "axes", &mut columns)?;
            SMatrix::from_columns(&columns)
        } else {
            SMatrix::identity()
        };

        Self::try_new(center, half_extents, axes).ok_or_else(|| {
            JsonError::invalid(
                "cuboid",
                "half extents must be positive and axes must be orthonormal",
            )
        })
    }
}

impl<const D: usize> JsonSer for Cuboid<D> {
    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "center": self.center.as_slice(),
            "half_extents": self.half_extents.as_slice(),
            "axes": Vec::from_iter(
                self.axes
                    .column_iter()
                    .map(|column| Vec::from_iter(column.iter().copied()))
            ),
        })
    }
}

impl<const D: usize> Random for Cuboid<D> {
    fn random(rng: &mut (impl rand::Rng + ?Sized)) -> Self {
        let center = rand_vect(rng, MAX_MIRROR_COORD);
        let half_extents = SVector::from_fn(|_, _| rng.gen_range(0.25..MAX_MIRROR_COORD / 4.0));

        loop {
            let mut columns = [SVector::zeros(); D];
            for c in &mut columns {
                *c = rand_vect(rng, 1.0);
            }

            if SVector::orthonormalize(&mut columns) < D {
                continue;
            }

            if let Some(cuboid) =
                Self::try_new(center, half_extents, SMatrix::from_columns(&columns))
            {
                break cuboid;
            }
        }
    }
}
