#![cfg_attr(not(test), no_std)]

extern crate alloc;

use alloc::{boxed::Box, rc::Rc, sync::Arc, vec::Vec};
use core::{cmp::Ordering, mem, ops::Deref};

pub use either;
pub use nalgebra;

use either::Either;
use impl_trait_for_tuples::impl_for_tuples;
use nalgebra::{SMatrix, SVector, Unit};

mod events;
mod reflector;
mod segments;

pub use events::*;
pub use reflector::*;
pub use segments::*;

pub type Float = f64;

/// Stable identifier of a tagged surface, used to track which objects a beam touches across casts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SurfaceId(pub u32);

/// What happens to a ray once it reaches a surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Response {
    #[default]
    Reflect,
    /// The ray stops at the surface. Observers still get notified of the hit.
    Absorb,
}

/// The tag attached to every tangent reported while a mirror is being queried.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Surface {
    pub id: Option<SurfaceId>,
    pub response: Response,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Contact<const D: usize> {
    pub(crate) dist: Float,
    pub(crate) direction: HyperPlane<D>,
    pub(crate) surface: Surface,
}

/// State of a single intersection query: the ray being tested,
/// the accepted distance window, and the closest tangent found so far.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationCtx<const D: usize> {
    ray: Ray<D>,
    eps: Float,
    max_dist: Float,
    surface: Surface,
    closest: Option<Contact<D>>,
}

impl<const D: usize> SimulationCtx<D> {
    /// `eps` is the minimum distance the ray must travel before an intersection counts.
    ///
    /// It keeps a ray that just bounced off a surface from hitting that same surface
    /// again because of roundoff errors.
    #[inline]
    pub fn new(ray: Ray<D>, eps: Float) -> Self {
        Self {
            ray,
            eps,
            max_dist: Float::INFINITY,
            surface: Surface::default(),
            closest: None,
        }
    }

    /// Discard intersections further than `max_dist` from the ray's origin.
    #[inline]
    #[must_use]
    pub fn with_max_dist(mut self, max_dist: Float) -> Self {
        self.max_dist = max_dist;
        self
    }

    #[inline]
    pub fn ray(&self) -> &Ray<D> {
        &self.ray
    }

    #[inline]
    pub fn eps(&self) -> Float {
        self.eps
    }

    /// Report a tangent (hyper)plane at one of the intersections between a mirror and the ray.
    ///
    /// Tangents parallel to the ray, behind it, closer than `eps` or past the
    /// maximum distance are ignored.
    #[inline]
    pub fn add_tangent(&mut self, tangent: Plane<D>) {
        let Some(d) = tangent.try_ray_intersection(&self.ray) else {
            log::trace!("ignoring a tangent parallel to the ray");
            return;
        };

        if d >= self.eps
            && d <= self.max_dist
            && self.closest.as_ref().map_or(true, |c| c.dist > d)
        {
            self.closest = Some(Contact {
                dist: d,
                direction: tangent.direction,
                surface: self.surface,
            });
        }
    }

    /// Run `f` with every tangent it reports tagged with `surface`.
    #[inline]
    pub fn with_surface(&mut self, surface: Surface, f: impl FnOnce(&mut Self)) {
        let outer = mem::replace(&mut self.surface, surface);
        f(self);
        self.surface = outer;
    }

    /// Distance to the closest tangent accepted so far, if any.
    #[inline]
    pub fn closest_distance(&self) -> Option<Float> {
        self.closest.as_ref().map(|c| c.dist)
    }

    #[inline]
    pub(crate) fn take_closest(&mut self) -> Option<Contact<D>> {
        self.closest.take()
    }
}

/// A light ray, represented as a half-line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray<const D: usize> {
    /// The starting point of the half-line
    pub origin: SVector<Float, D>,
    /// The direction of the half-line
    pub direction: Unit<SVector<Float, D>>,
}

impl<const D: usize> Ray<D> {
    /// Returns `None` if `direction` is (nearly) zero, or if any coordinate is not finite.
    #[inline]
    pub fn try_new(
        origin: impl Into<SVector<Float, D>>,
        direction: impl Into<SVector<Float, D>>,
    ) -> Option<Self> {
        let origin = origin.into();
        let direction = direction.into();

        if !origin.iter().chain(direction.iter()).all(|c| c.is_finite()) {
            return None;
        }

        Unit::try_new(direction, Float::EPSILON).map(|direction| Self { origin, direction })
    }

    /// # Panics
    ///
    /// if `direction` is zero, or not finite
    #[inline]
    pub fn new_normalize(
        origin: impl Into<SVector<Float, D>>,
        direction: impl Into<SVector<Float, D>>,
    ) -> Self {
        Self::try_new(origin, direction).expect("direction must be finite and non-zero")
    }

    /// Reflect the ray's direction with respect to the given hyperplane
    #[inline]
    pub fn reflect_dir(&mut self, dir_space: &HyperPlane<D>) {
        self.direction = dir_space.reflect_unit(self.direction);
    }

    /// Move the ray's position forward (or backward if t < 0.0) by `t`
    #[inline]
    pub fn advance(&mut self, t: Float) {
        self.origin += t * self.direction.as_ref();
    }

    /// Get the point at distance `t` (can be negative) from the ray's origin
    #[inline]
    pub fn at(&self, t: Float) -> SVector<Float, D> {
        self.origin + self.direction.as_ref() * t
    }
}

/// Solves `origin + t_1 * dir = v0 + sum t_k * v_k` for `[t_1, ..., t_d]`,
/// with `columns[1..]` being the `v_k`s.
#[inline]
fn solve_coordinates<const D: usize>(
    columns: &[SVector<Float, D>; D],
    ray: &Ray<D>,
    v0: &SVector<Float, D>,
) -> Option<SVector<Float, D>> {
    let mut a = SMatrix::<Float, D, D>::from_columns(columns);
    a.set_column(0, ray.direction.as_ref());

    a.try_inverse_mut()
        // a now contains a^-1
        .then(|| {
            let mut v = a * (ray.origin - v0);
            v[0] = -v[0];
            v
        })
}

/// An affine hyperplane, stored as a starting point followed by `D - 1` vectors spanning it.
#[derive(Clone, Debug, PartialEq)]
pub struct HyperPlaneBasis<const D: usize> {
    /// See [`Self::new`] for info on the layout of this field
    vectors: [SVector<Float, D>; D],
}

impl<const D: usize> HyperPlaneBasis<D> {
    /// The first element of `vectors` is the plane's starting point `v0`.
    ///
    /// The remaining `D - 1` vectors are a free family spanning its direction space.
    ///
    /// Returns `None` if the family isn't free.
    #[inline]
    pub fn new(vectors: [SVector<Float, D>; D]) -> Option<(Self, HyperPlaneBasisOrtho<D>)> {
        let mut orthonormalized = vectors;
        (SVector::orthonormalize(&mut orthonormalized[1..]) == D - 1).then_some((
            Self { vectors },
            HyperPlaneBasisOrtho {
                vectors: orthonormalized,
            },
        ))
    }

    #[inline]
    pub fn v0(&self) -> &SVector<Float, D> {
        &self.vectors[0]
    }

    /// Translating `v0` translates the whole plane.
    #[inline]
    pub fn v0_mut(&mut self) -> &mut SVector<Float, D> {
        &mut self.vectors[0]
    }

    /// The returned slice is guaranteed to be of length `D - 1`.
    #[inline]
    pub fn basis(&self) -> &[SVector<Float, D>] {
        &self.vectors[1..]
    }

    #[inline]
    pub fn vectors_raw(&self) -> &[SVector<Float, D>; D] {
        &self.vectors
    }

    /// Returns a vector `[t_1, ..., t_d]` such that
    ///
    /// `ray.origin + t_1 * ray.direction = v0 + sum for k in [2 ; d] t_k * v_k`
    ///
    /// where `[v_2, ..., v_d]` is `self.basis()`.
    ///
    /// Returns `None` if `ray` is parallel to the plane.
    #[inline]
    pub fn intersection_coordinates(
        &self,
        ray: &Ray<D>,
        v0: &SVector<Float, D>,
    ) -> Option<SVector<Float, D>> {
        solve_coordinates(&self.vectors, ray, v0)
    }
}

/// Like [`HyperPlaneBasis`], but the basis stored is guaranteed
/// to be orthonormal, enabling projections and symmetries.
#[derive(Clone, Debug, PartialEq)]
pub struct HyperPlaneBasisOrtho<const D: usize> {
    vectors: [SVector<Float, D>; D],
}

impl<const D: usize> HyperPlaneBasisOrtho<D> {
    #[inline]
    pub fn v0(&self) -> &SVector<Float, D> {
        &self.vectors[0]
    }

    /// The returned slice is guaranteed to be of length `D - 1`.
    #[inline]
    pub fn basis(&self) -> &[SVector<Float, D>] {
        &self.vectors[1..]
    }

    /// Returns the orthogonal projection of `v` onto `self`
    #[inline]
    pub fn project(&self, v: SVector<Float, D>) -> SVector<Float, D> {
        self.basis().iter().map(|e| v.dot(e) * e).sum()
    }

    /// Returns the point of the plane starting at `v0` closest to `p`.
    #[inline]
    pub fn closest_point_to_plane(
        &self,
        v0: &SVector<Float, D>,
        p: SVector<Float, D>,
    ) -> SVector<Float, D> {
        v0 + self.project(p - v0)
    }

    /// See [`HyperPlaneBasis::intersection_coordinates`].
    #[inline]
    pub fn intersection_coordinates(
        &self,
        ray: &Ray<D>,
        v0: &SVector<Float, D>,
    ) -> Option<SVector<Float, D>> {
        solve_coordinates(&self.vectors, ray, v0)
    }

    /// A unit vector orthogonal to `self`.
    ///
    /// # Panics
    ///
    /// if `D == 0`
    #[inline]
    pub fn normal(&self) -> Unit<SVector<Float, D>> {
        // the standard basis vector sticking out the most never projects to zero
        let residual = (0..D)
            .map(|i| {
                let mut e = SVector::<Float, D>::zeros();
                e[i] = 1.0;
                e - self.project(e)
            })
            .max_by(|a, b| {
                a.norm_squared()
                    .partial_cmp(&b.norm_squared())
                    .unwrap_or(Ordering::Equal)
            })
            .expect("dimension must not be zero");

        Unit::new_normalize(residual)
    }
}

/// Different ways of representing the direction space of a hyperplane
#[derive(Clone, Debug, PartialEq)]
pub enum HyperPlane<const D: usize> {
    Plane(HyperPlaneBasisOrtho<D>),
    Normal(Unit<SVector<Float, D>>),
}

impl<const D: usize> HyperPlane<D> {
    /// Reflect a vector w.r.t this hyperplane
    #[inline]
    pub fn reflect(&self, v: SVector<Float, D>) -> SVector<Float, D> {
        match self {
            HyperPlane::Plane(plane) => 2.0 * plane.project(v) - v,
            HyperPlane::Normal(normal) => {
                let n = normal.as_ref();
                v - 2.0 * v.dot(n) * n
            }
        }
    }

    /// Reflect a unit vector w.r.t. this hyperplane
    #[inline]
    pub fn reflect_unit(&self, v: Unit<SVector<Float, D>>) -> Unit<SVector<Float, D>> {
        // renormalized so rounding doesn't build up over many bounces
        Unit::new_normalize(self.reflect(v.into_inner()))
    }

    /// The unit normal of this hyperplane, pointing against `incident`.
    #[inline]
    pub fn normal_facing(&self, incident: &Unit<SVector<Float, D>>) -> Unit<SVector<Float, D>> {
        let n = match self {
            HyperPlane::Plane(plane) => plane.normal(),
            HyperPlane::Normal(normal) => *normal,
        };

        if n.dot(incident.as_ref()) > 0.0 {
            Unit::new_unchecked(-n.into_inner())
        } else {
            n
        }
    }

    /// Return the distance `t` such that `ray.at(t)` intersects with the affine
    /// hyperplane starting at `v0`, and whose direction space is `self`.
    ///
    /// Returns `None` if `ray` is parallel to `self`
    #[inline]
    pub fn try_ray_intersection(&self, v0: &SVector<Float, D>, ray: &Ray<D>) -> Option<Float> {
        match self {
            HyperPlane::Plane(plane) => plane.intersection_coordinates(ray, v0).map(|v| v[0]),
            HyperPlane::Normal(normal) => {
                let u = ray.direction.dot(normal.as_ref());
                (u.abs() > Float::EPSILON).then(|| (v0 - ray.origin).dot(normal.as_ref()) / u)
            }
        }
    }
}

/// Where a tangent plane sits relative to the ray that produced it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Intersection<const D: usize> {
    /// `ray.at(t)` belongs to the tangent. Use it when `t` is already known.
    Distance(Float),
    /// Any point of the tangent, not necessarily on the ray.
    StartingPoint(SVector<Float, D>),
}

/// An affine tangent (hyper)plane reported by a [`Mirror`]
#[derive(Clone, Debug, PartialEq)]
pub struct Plane<const D: usize> {
    pub intersection: Intersection<D>,
    pub direction: HyperPlane<D>,
}

impl<const D: usize> Plane<D> {
    /// Return the distance `t` such that `ray.at(t)` intersects with this tangent plane
    ///
    /// Returns `None` if `ray` is parallel to `self`
    #[inline]
    pub fn try_ray_intersection(&self, ray: &Ray<D>) -> Option<Float> {
        match &self.intersection {
            Intersection::Distance(t) => Some(*t),
            Intersection::StartingPoint(p) => self.direction.try_ray_intersection(p, ray),
        }
    }
}

/// A reflective (hyper)surface in `D`-dimensional euclidean space.
///
/// This is the trait to implement when creating a new mirror shape.
///
/// Mirrors in 0 dimensions cause panics or unspecified results.
pub trait Mirror<const D: usize> {
    /// Adds the tangents to this mirror at the points where it intersects
    /// the ray ([`ctx.ray()`](SimulationCtx::ray)), in no particular order,
    /// with [`ctx.add_tangent(...)`](SimulationCtx::add_tangent).
    ///
    /// Adds nothing if the ray doesn't intersect with the mirror.
    ///
    /// Tangents "behind" the ray (`ray.at(t)` where `t < 0.0`) may be added, the
    /// context discards them.
    ///
    /// This method must be deterministic: for a given ray, it always
    /// reports the same tangents, regardless of external state.
    fn add_tangents(&self, ctx: &mut SimulationCtx<D>);
}

#[impl_for_tuples(1, 16)]
impl<const D: usize> Mirror<D> for T {
    for_tuples!( where #( T: Mirror<D> )* );

    #[inline]
    fn add_tangents(&self, ctx: &mut SimulationCtx<D>) {
        for_tuples!( #( T.add_tangents(ctx); )* );
    }
}

impl<const D: usize, L: Mirror<D>, R: Mirror<D>> Mirror<D> for Either<L, R> {
    #[inline]
    fn add_tangents(&self, ctx: &mut SimulationCtx<D>) {
        either::for_both!(self, mirror => mirror.add_tangents(ctx))
    }
}

impl<const D: usize, T: Mirror<D>> Mirror<D> for [T] {
    #[inline]
    fn add_tangents(&self, ctx: &mut SimulationCtx<D>) {
        self.iter().for_each(|mirror| mirror.add_tangents(ctx))
    }
}

impl<const N: usize, const D: usize, T: Mirror<D>> Mirror<D> for [T; N] {
    #[inline]
    fn add_tangents(&self, ctx: &mut SimulationCtx<D>) {
        self.as_slice().add_tangents(ctx)
    }
}

// A blanket impl over `Deref` would make implementing `Mirror` for new types downstream impossible.

impl<const D: usize, T: Mirror<D> + ?Sized> Mirror<D> for Box<T> {
    #[inline]
    fn add_tangents(&self, ctx: &mut SimulationCtx<D>) {
        self.deref().add_tangents(ctx)
    }
}

impl<const D: usize, T: Mirror<D> + ?Sized> Mirror<D> for Arc<T> {
    #[inline]
    fn add_tangents(&self, ctx: &mut SimulationCtx<D>) {
        self.deref().add_tangents(ctx)
    }
}

impl<const D: usize, T: Mirror<D> + ?Sized> Mirror<D> for Rc<T> {
    #[inline]
    fn add_tangents(&self, ctx: &mut SimulationCtx<D>) {
        self.deref().add_tangents(ctx)
    }
}

impl<const D: usize, T: Mirror<D>> Mirror<D> for Vec<T> {
    #[inline]
    fn add_tangents(&self, ctx: &mut SimulationCtx<D>) {
        self.as_slice().add_tangents(ctx)
    }
}

impl<const D: usize, T: Mirror<D> + ?Sized> Mirror<D> for &T {
    #[inline]
    fn add_tangents(&self, ctx: &mut SimulationCtx<D>) {
        (*self).add_tangents(ctx)
    }
}

impl<const D: usize, T: Mirror<D> + ?Sized> Mirror<D> for &mut T {
    #[inline]
    fn add_tangents(&self, ctx: &mut SimulationCtx<D>) {
        self.deref().add_tangents(ctx)
    }
}

/// A mirror whose tangents carry a [`Surface`] tag.
#[derive(Clone, Debug, PartialEq)]
pub struct Tagged<M> {
    pub surface: Surface,
    pub mirror: M,
}

impl<M> Tagged<M> {
    #[inline]
    pub fn new(id: SurfaceId, response: Response, mirror: M) -> Self {
        Self {
            surface: Surface {
                id: Some(id),
                response,
            },
            mirror,
        }
    }

    #[inline]
    pub fn reflective(id: SurfaceId, mirror: M) -> Self {
        Self::new(id, Response::Reflect, mirror)
    }

    /// The ray stops when it reaches `mirror`.
    #[inline]
    pub fn absorbing(id: SurfaceId, mirror: M) -> Self {
        Self::new(id, Response::Absorb, mirror)
    }
}

impl<const D: usize, M: Mirror<D>> Mirror<D> for Tagged<M> {
    #[inline]
    fn add_tangents(&self, ctx: &mut SimulationCtx<D>) {
        ctx.with_surface(self.surface, |ctx| self.mirror.add_tangents(ctx))
    }
}

/// The successive points where a ray meets a mirror.
///
/// Unlike [`Reflector::cast`], there is no bounce or distance limit, the iterator ends
/// when the ray escapes or reaches an absorbing surface. Use [`Iterator::take`] otherwise.
#[derive(Clone, Debug)]
pub struct RayPath<'a, const D: usize, M: ?Sized> {
    ray: Option<Ray<D>>,
    eps: Float,
    mirror: &'a M,
}

impl<'a, const D: usize, M: Mirror<D> + ?Sized> RayPath<'a, D, M> {
    #[inline]
    pub fn new(mirror: &'a M, ray: Ray<D>, eps: Float) -> Self {
        Self {
            ray: Some(ray),
            eps,
            mirror,
        }
    }

    /// `None` once the path has ended.
    #[inline]
    pub fn current_ray(&self) -> Option<&Ray<D>> {
        self.ray.as_ref()
    }
}

impl<'a, const D: usize, M: Mirror<D> + ?Sized> Iterator for RayPath<'a, D, M> {
    type Item = SVector<Float, D>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut ray = self.ray?;

        let mut ctx = SimulationCtx::new(ray, self.eps);
        self.mirror.add_tangents(&mut ctx);

        let Some(contact) = ctx.take_closest() else {
            self.ray = None;
            return None;
        };

        ray.advance(contact.dist);
        let pt = ray.origin;

        self.ray = match contact.surface.response {
            Response::Reflect => {
                ray.reflect_dir(&contact.direction);
                Some(ray)
            }
            Response::Absorb => None,
        };

        Some(pt)
    }
}

/// Checks if appending `pt` to `path` makes the path retrace one of its earlier
/// legs, in which case it will loop forever. Returns the index of that leg.
///
/// `e` is used for comparisons.
#[inline]
pub fn loop_index<const D: usize>(
    path: &[SVector<Float, D>],
    pt: SVector<Float, D>,
    e: Float,
) -> Option<usize> {
    path.split_last().and_then(|(last_pt, points)| {
        points.windows(2).enumerate().find_map(|(i, window)| {
            let [this_pt, next_pt] = window else {
                // window.len() is always 2
                unreachable!()
            };
            ((last_pt - this_pt).norm() <= e && (pt - next_pt).norm() <= e).then_some(i)
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Vector2, Vector3};

    /// The infinite plane `y = height`.
    pub(crate) struct Floor(pub Float);

    impl Mirror<3> for Floor {
        fn add_tangents(&self, ctx: &mut SimulationCtx<3>) {
            ctx.add_tangent(Plane {
                intersection: Intersection::StartingPoint(Vector3::new(0., self.0, 0.)),
                direction: HyperPlane::Normal(Vector3::y_axis()),
            });
        }
    }

    fn closest<M: Mirror<3> + ?Sized>(mirror: &M, ray: Ray<3>) -> Option<Float> {
        let mut ctx = SimulationCtx::new(ray, reflector::DEFAULT_EPS);
        mirror.add_tangents(&mut ctx);
        ctx.closest_distance()
    }

    #[test]
    fn test_ray_rejects_degenerate_directions() {
        assert!(Ray::<3>::try_new([0., 0., 0.], [0., 0., 0.]).is_none());
        assert!(Ray::<3>::try_new([0., 0., 0.], [Float::NAN, 1., 0.]).is_none());
        assert!(Ray::<3>::try_new([Float::INFINITY, 0., 0.], [0., 1., 0.]).is_none());

        let ray = Ray::<2>::try_new([1., 1.], [3., 4.]).unwrap();
        assert!((ray.direction.norm() - 1.0).abs() < 1e-12);
        assert!((ray.at(5.0) - Vector2::new(4., 5.)).norm() < 1e-12);
    }

    #[test]
    fn test_reflection_formula() {
        let n = Unit::new_normalize(Vector3::new(1., 2., -0.5));
        let d = Unit::new_normalize(Vector3::new(-0.3, -1., 0.2));

        let reflected = HyperPlane::Normal(n).reflect_unit(d);
        let expected = d.into_inner() - 2.0 * d.dot(&n) * n.into_inner();

        assert!((reflected.into_inner() - expected).norm() < 1e-12);
        assert!((reflected.norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_reflections_stay_unit() {
        // a normal computed from a point slightly off its mirror
        let off = HyperPlane::Normal(Unit::new_unchecked(Vector3::new(0., 1. + 1e-9, 0.)));
        let tilted = HyperPlane::Normal(Unit::new_normalize(Vector3::new(1., 2., -0.5)));

        let mut d = Unit::new_normalize(Vector3::new(-0.3, -1., 0.2));
        for _ in 0..10_000 {
            d = tilted.reflect_unit(off.reflect_unit(d));
        }

        assert!((d.norm() - 1.0).abs() < 1e-15);
    }

    #[test]
    fn test_normal_is_orthogonal_to_the_plane() {
        let (_, ortho) = HyperPlaneBasis::new([
            Vector3::zeros(),
            Vector3::new(1., 1., 0.),
            Vector3::new(0., 0., 1.),
        ])
        .unwrap();

        let n = ortho.normal();
        assert!((n.norm() - 1.0).abs() < 1e-12);
        assert!(n.dot(&Vector3::new(1., 1., 0.)).abs() < 1e-12);
        assert!(n.z.abs() < 1e-12);
    }

    #[test]
    fn test_basis_and_normal_reflections_agree() {
        let (_, ortho) = HyperPlaneBasis::new([
            Vector3::zeros(),
            Vector3::new(1., 0., 0.),
            Vector3::new(1., 0., 1.),
        ])
        .unwrap();

        let v = Vector3::new(0.2, -0.9, 0.4);
        let by_basis = HyperPlane::Plane(ortho.clone()).reflect(v);
        let by_normal = HyperPlane::Normal(Vector3::y_axis()).reflect(v);

        assert!((by_basis - by_normal).norm() < 1e-12);
        assert!(ortho.normal().dot(&Vector3::y()).abs() > 1.0 - 1e-12);
    }

    #[test]
    fn test_free_family_required() {
        let flat = HyperPlaneBasis::new([
            Vector3::zeros(),
            Vector3::new(1., 0., 0.),
            Vector3::new(2., 0., 0.),
        ]);
        assert!(flat.is_none());
    }

    #[test]
    fn test_normal_faces_incident_ray() {
        let down = Unit::new_normalize(Vector3::new(0., -1., 0.));
        let up = Unit::new_normalize(Vector3::new(0., 1., 0.));
        let plane = HyperPlane::Normal(Vector3::y_axis());

        assert_eq!(plane.normal_facing(&down), Vector3::y_axis());
        assert_eq!(plane.normal_facing(&up).into_inner(), -Vector3::y());
    }

    #[test]
    fn test_ctx_discards_near_and_far_tangents() {
        // starting on the floor: the floor itself must be ignored
        let on_floor = Ray::new_normalize([0., 0., 0.], [0., 1., 0.]);
        assert_eq!(closest(&Floor(0.), on_floor), None);

        let above = Ray::new_normalize([0., 5., 0.], [0., -1., 0.]);
        assert_eq!(closest(&Floor(0.), above), Some(5.));

        let mut ctx = SimulationCtx::new(above, reflector::DEFAULT_EPS).with_max_dist(4.);
        Floor(0.).add_tangents(&mut ctx);
        assert_eq!(ctx.closest_distance(), None);

        // parallel rays never panic
        let grazing = Ray::new_normalize([0., 1., 0.], [1., 0., 0.]);
        assert_eq!(closest(&Floor(0.), grazing), None);
    }

    #[test]
    fn test_composite_mirrors_keep_the_closest() {
        let ray = Ray::new_normalize([0., 5., 0.], [0., -1., 0.]);

        assert_eq!(closest(&[Floor(0.), Floor(2.), Floor(-3.)], ray), Some(3.));
        assert_eq!(closest(&(Floor(1.), Floor(4.)), ray), Some(1.));
        assert_eq!(
            closest(&Either::<Floor, Floor>::Right(Floor(-1.)), ray),
            Some(6.)
        );

        let boxed: Vec<Box<dyn Mirror<3>>> = vec![Box::new(Floor(0.)), Box::new(Floor(2.5))];
        assert_eq!(closest(&boxed, ray), Some(2.5));
    }

    #[test]
    fn test_tagging_is_scoped() {
        let ray = Ray::new_normalize([0., 5., 0.], [0., -1., 0.]);
        let mirrors = (
            Floor(0.),
            Tagged::absorbing(SurfaceId(7), Floor(2.)),
            Floor(1.),
        );

        let mut ctx = SimulationCtx::new(ray, reflector::DEFAULT_EPS);
        mirrors.add_tangents(&mut ctx);
        let contact = ctx.take_closest().unwrap();

        assert_eq!(contact.dist, 3.);
        assert_eq!(contact.surface.id, Some(SurfaceId(7)));
        assert_eq!(contact.surface.response, Response::Absorb);

        let untagged = (Tagged::absorbing(SurfaceId(7), Floor(-2.)), Floor(1.));
        let mut ctx = SimulationCtx::new(ray, reflector::DEFAULT_EPS);
        untagged.add_tangents(&mut ctx);
        assert_eq!(ctx.take_closest().unwrap().surface, Surface::default());
    }

    #[test]
    fn test_ray_path() {
        let ray = Ray::new_normalize([0., 0.5, 0.], [1., 1., 0.]);
        let trap = (Floor(0.), Floor(1.));

        let points: Vec<_> = RayPath::new(&trap, ray, reflector::DEFAULT_EPS)
            .take(3)
            .collect();

        assert_eq!(points.len(), 3);
        assert!((points[0] - Vector3::new(0.5, 1., 0.)).norm() < 1e-9);
        assert!((points[1] - Vector3::new(1.5, 0., 0.)).norm() < 1e-9);
        assert!((points[2] - Vector3::new(2.5, 1., 0.)).norm() < 1e-9);

        // heads away from the only mirror
        let mut path = RayPath::new(&Floor(0.), ray, reflector::DEFAULT_EPS);
        assert!(path.next().is_none());
        assert!(path.current_ray().is_none());

        let down = Ray::new_normalize([0., 0.5, 0.], [0., -1., 0.]);
        let absorbing = (Tagged::absorbing(SurfaceId(0), Floor(0.)), Floor(1.));
        assert_eq!(RayPath::new(&absorbing, down, reflector::DEFAULT_EPS).count(), 1);
    }

    #[test]
    fn test_loop_index() {
        let path = [
            Vector2::new(0., 0.),
            Vector2::new(1., 0.),
            Vector2::new(1., 1.),
            Vector2::new(0., 0.),
        ];

        // back to the second leg: (0, 0) -> (1, 0)
        assert_eq!(loop_index(&path, Vector2::new(1., 0.), 1e-9), Some(0));
        assert_eq!(loop_index(&path, Vector2::new(0., 1.), 1e-9), None);
        assert_eq!(loop_index::<2>(&[], Vector2::zeros(), 1e-9), None);
    }
}
