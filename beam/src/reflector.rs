use super::*;

use core::fmt;

/// Intersections closer than this to a ray's origin are ignored.
///
/// Hit points on curved mirrors are only accurate to a few `1e-14`, so this has
/// to stay well above that.
pub const DEFAULT_EPS: Float = 1e-9;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReflectorParams {
    /// Maximum number of reflections per cast.
    pub bounce_limit: usize,
    /// Maximum distance travelled per cast. A cast with a non-finite `far` is
    /// [`Termination::Degenerate`].
    pub far: Float,
    /// See [`SimulationCtx::new`].
    pub eps: Float,
}

impl Default for ReflectorParams {
    fn default() -> Self {
        Self {
            bounce_limit: 10,
            far: 20.0,
            eps: DEFAULT_EPS,
        }
    }
}

/// An intersection between the beam and a mirror, as seen by observers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hit<const D: usize> {
    pub position: SVector<Float, D>,
    /// Direction of the ray that reached `position`, before reflection.
    pub direction: Unit<SVector<Float, D>>,
    /// Normal of the surface at `position`, facing the incoming ray.
    pub normal: Unit<SVector<Float, D>>,
    /// Length of the segment that ends at this hit.
    pub distance: Float,
    /// Number of reflections before this hit during the current cast.
    pub bounce: usize,
    pub surface: Surface,
}

/// Why a cast stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Termination {
    /// The direction was zero or not finite, or so was `far`. Nothing was written.
    Degenerate,
    /// The last segment met no mirror within the remaining distance.
    Escaped,
    /// The beam reached an absorbing surface.
    Absorbed,
    BounceLimit,
    DistanceExhausted,
    BufferFull,
}

impl Termination {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Degenerate => "degenerate",
            Self::Escaped => "escaped",
            Self::Absorbed => "absorbed",
            Self::BounceLimit => "bounce_limit",
            Self::DistanceExhausted => "distance_exhausted",
            Self::BufferFull => "buffer_full",
        }
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Casts a beam through a mirror once per frame, writing its path to a bounded [`SegmentBuffer`].
#[derive(Clone, Debug)]
pub struct Reflector<const D: usize> {
    params: ReflectorParams,
    segments: SegmentBuffer<D>,
}

impl<const D: usize> Reflector<D> {
    /// `capacity` is the maximum number of segments a cast (observers included) can write.
    pub fn new(params: ReflectorParams, capacity: usize) -> Self {
        Self {
            params,
            segments: SegmentBuffer::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn params(&self) -> &ReflectorParams {
        &self.params
    }

    #[inline]
    pub fn params_mut(&mut self) -> &mut ReflectorParams {
        &mut self.params
    }

    /// The path written by the last cast.
    #[inline]
    pub fn segments(&self) -> &SegmentBuffer<D> {
        &self.segments
    }

    /// Casts a ray from `origin` towards `direction`, bouncing it off `mirror`.
    ///
    /// `on_hit` is called synchronously for every intersection, with write access to
    /// the segments of this cast. The segment ending at the hit is already written.
    ///
    /// The previous path is discarded. A zero or non-finite `direction`, or a
    /// non-finite `far`, leaves the buffer empty.
    pub fn cast<M: Mirror<D> + ?Sized>(
        &mut self,
        mirror: &M,
        origin: impl Into<SVector<Float, D>>,
        direction: impl Into<SVector<Float, D>>,
        mut on_hit: impl FnMut(&Hit<D>, &mut SegmentBuffer<D>),
    ) -> Termination {
        self.segments.clear();

        let Some(mut ray) = Ray::try_new(origin, direction) else {
            log::debug!("degenerate ray, nothing to cast");
            return Termination::Degenerate;
        };

        let ReflectorParams {
            bounce_limit,
            far,
            eps,
        } = self.params;

        if !far.is_finite() {
            log::warn!("far must be finite, got {far}");
            return Termination::Degenerate;
        }

        let mut bounces_left = bounce_limit;
        let mut dist_left = far.max(0.0);

        let termination = loop {
            if self.segments.is_full() {
                break Termination::BufferFull;
            }

            if dist_left <= 0.0 {
                break Termination::DistanceExhausted;
            }

            if bounces_left == 0 {
                self.segments
                    .push(Segment::new(ray.origin, ray.at(dist_left)));
                break Termination::BounceLimit;
            }

            let mut ctx = SimulationCtx::new(ray, eps).with_max_dist(dist_left);
            mirror.add_tangents(&mut ctx);

            let Some(Contact {
                dist,
                direction: tangent,
                surface,
            }) = ctx.take_closest()
            else {
                self.segments
                    .push(Segment::new(ray.origin, ray.at(dist_left)));
                break Termination::Escaped;
            };

            let start = ray.origin;
            ray.advance(dist);
            self.segments.push(Segment::new(start, ray.origin));

            let hit = Hit {
                position: ray.origin,
                direction: ray.direction,
                normal: tangent.normal_facing(&ray.direction),
                distance: dist,
                bounce: bounce_limit - bounces_left,
                surface,
            };

            log::trace!(
                "bounce {} at {:?}, surface {:?}",
                hit.bounce,
                hit.position.as_slice(),
                surface.id,
            );

            on_hit(&hit, &mut self.segments);

            if surface.response == Response::Absorb {
                break Termination::Absorbed;
            }

            ray.reflect_dir(&tangent);
            bounces_left -= 1;
            dist_left -= dist;
        };

        log::debug!(
            "cast ended ({termination}) after {} segment(s)",
            self.segments.len()
        );

        termination
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::Floor;
    use nalgebra::Vector3;

    fn reflector(bounce_limit: usize, far: Float, capacity: usize) -> Reflector<3> {
        Reflector::new(
            ReflectorParams {
                bounce_limit,
                far,
                ..Default::default()
            },
            capacity,
        )
    }

    fn close(a: &SVector<Float, 3>, b: [Float; 3]) -> bool {
        (a - Vector3::from(b)).norm() < 1e-9
    }

    #[test]
    fn test_single_mirror_example() {
        let mut r = reflector(1, 20., 16);
        let mut hits = vec![];

        let termination = r.cast(&Floor(0.), [0., 5., 0.], [0., -1., 0.], |hit, _| {
            hits.push(*hit)
        });

        assert_eq!(termination, Termination::BounceLimit);

        let segments = r.segments().as_slice();
        assert_eq!(segments.len(), 2);
        assert!(close(&segments[0].start, [0., 5., 0.]));
        assert!(close(&segments[0].end, [0., 0., 0.]));
        assert!(close(&segments[1].start, [0., 0., 0.]));
        assert!(close(&segments[1].end, [0., 15., 0.]));

        assert_eq!(hits.len(), 1);
        assert!(close(&hits[0].normal, [0., 1., 0.]));
        assert!(close(&hits[0].direction, [0., -1., 0.]));
        assert!(close(&hits[0].position, [0., 0., 0.]));
        assert_eq!(hits[0].bounce, 0);
        assert!((hits[0].distance - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_bounces_writes_one_far_segment() {
        let mut r = reflector(0, 20., 16);
        let mut hit_count = 0;

        let dir = Vector3::new(1., -2., 0.5);
        let termination = r.cast(&Floor(0.), [0., 5., 0.], dir, |_, _| hit_count += 1);

        assert_eq!(termination, Termination::BounceLimit);
        assert_eq!(hit_count, 0);

        let segments = r.segments().as_slice();
        assert_eq!(segments.len(), 1);
        assert!((segments[0].length() - 20.0).abs() < 1e-9);

        let travelled = segments[0].direction().unwrap();
        assert!((travelled.into_inner() - dir.normalize()).norm() < 1e-9);
    }

    #[test]
    fn test_reflected_direction_matches_formula() {
        let mut r = reflector(1, 50., 16);
        let d = Vector3::new(0.6, -0.8, 0.);

        r.cast(&Floor(0.), [0., 4., 0.], d, |_, _| {});

        let out = r.segments().as_slice()[1].direction().unwrap();
        let n = Vector3::y();
        let expected = d - 2.0 * d.dot(&n) * n;

        assert!((out.into_inner() - expected).norm() < 1e-9);
        assert!((out.norm() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_escape_uses_remaining_distance() {
        let mut r = reflector(10, 20., 16);

        let termination = r.cast(&Floor(0.), [0., 5., 0.], [0., -1., 0.], |_, _| {});

        // nothing above the floor: the reflected ray escapes with 15 units left
        assert_eq!(termination, Termination::Escaped);
        assert_eq!(r.segments().len(), 2);
        assert!(close(&r.segments().as_slice()[1].end, [0., 15., 0.]));
        assert!((r.segments().total_length() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_distance_budget_discards_far_mirrors() {
        let mut r = reflector(10, 3., 16);
        let mut hit_count = 0;

        let termination = r.cast(&Floor(0.), [0., 5., 0.], [0., -1., 0.], |_, _| hit_count += 1);

        assert_eq!(termination, Termination::Escaped);
        assert_eq!(hit_count, 0);
        assert!(close(&r.segments().as_slice()[0].end, [0., 2., 0.]));
    }

    #[test]
    fn test_hit_exactly_at_far_distance() {
        let mut r = reflector(10, 5., 16);

        let termination = r.cast(&Floor(0.), [0., 5., 0.], [0., -1., 0.], |_, _| {});

        assert_eq!(termination, Termination::DistanceExhausted);
        assert_eq!(r.segments().len(), 1);
    }

    #[test]
    fn test_trapped_ray_respects_limits() {
        // two parallel floors trap the ray forever
        let mirrors = (Floor(0.), Floor(1.));

        for (bounce_limit, capacity) in [(3, 64), (100, 64), (100, 5)] {
            let mut r = reflector(bounce_limit, 1000., capacity);
            let termination = r.cast(&mirrors, [0., 0.5, 0.], [0.1, 1., 0.], |_, _| {});

            let len = r.segments().len();
            assert!(len <= bounce_limit + 1);
            assert!(len <= capacity);

            if capacity < bounce_limit {
                assert_eq!(termination, Termination::BufferFull);
                assert_eq!(len, capacity);
            } else {
                assert_eq!(termination, Termination::BounceLimit);
                assert_eq!(len, bounce_limit + 1);
            }
        }
    }

    #[test]
    fn test_absorbing_surface_stops_the_beam() {
        let mirrors = (Tagged::absorbing(SurfaceId(1), Floor(0.)), Floor(10.));
        let mut r = reflector(10, 20., 16);
        let mut surfaces = vec![];

        let termination = r.cast(&mirrors, [0., 5., 0.], [0., -1., 0.], |hit, _| {
            surfaces.push(hit.surface)
        });

        assert_eq!(termination, Termination::Absorbed);
        assert_eq!(r.segments().len(), 1);
        assert_eq!(surfaces.len(), 1);
        assert_eq!(surfaces[0].id, Some(SurfaceId(1)));
    }

    #[test]
    fn test_observers_can_extend_the_path() {
        let mirrors = Tagged::absorbing(SurfaceId(1), Floor(0.));
        let mut r = reflector(10, 20., 2);

        r.cast(&mirrors, [0., 5., 0.], [0., -1., 0.], |_, segments| {
            assert!(segments.extend_to([0., -1., 0.]));
            assert!(!segments.extend_to([0., -2., 0.]));
        });

        assert_eq!(r.segments().len(), 2);
        assert!(close(&r.segments().as_slice()[1].end, [0., -1., 0.]));
    }

    #[test]
    fn test_degenerate_direction_is_a_no_op() {
        let mut r = reflector(10, 20., 16);
        r.cast(&Floor(0.), [0., 5., 0.], [0., -1., 0.], |_, _| {});
        assert!(!r.segments().is_empty());

        let mut called = false;
        let termination = r.cast(&Floor(0.), [0., 5., 0.], [0., 0., 0.], |_, _| called = true);

        assert_eq!(termination, Termination::Degenerate);
        assert!(r.segments().is_empty());
        assert!(!called);
    }

    #[test]
    fn test_non_finite_far_is_rejected() {
        for far in [Float::INFINITY, Float::NEG_INFINITY, Float::NAN] {
            let mut r = reflector(0, far, 16);
            let mut called = false;

            let termination = r.cast(&Floor(-1.), [0., 0., 0.], [0., 1., 0.], |_, _| called = true);

            assert_eq!(termination, Termination::Degenerate);
            assert!(r.segments().is_empty());
            assert!(!called);
        }

        // still usable once `far` is fixed
        let mut r = reflector(0, Float::INFINITY, 16);
        r.params_mut().far = 2.;
        assert_eq!(
            r.cast(&Floor(-1.), [0., 0., 0.], [0., 1., 0.], |_, _| {}),
            Termination::BounceLimit
        );
        assert!(close(&r.segments().as_slice()[0].end, [0., 2., 0.]));
    }

    #[test]
    fn test_casts_are_deterministic() {
        let mirrors = (Floor(0.), Floor(3.));
        let mut r = reflector(7, 40., 16);

        r.cast(&mirrors, [0., 1., 0.], [0.3, 1., -0.2], |_, _| {});
        let first = r.segments().as_slice().to_vec();

        r.cast(&mirrors, [0., 1., 0.], [0.3, 1., -0.2], |_, _| {});
        assert_eq!(first.as_slice(), r.segments().as_slice());
    }
}
