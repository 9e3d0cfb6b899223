use beam::nalgebra::SVector;
use beam::*;

use core::iter;
pub use rand;

pub trait Random: Sized {
    /// Generate a randomized version of this mirror using the provided `rng`
    ///
    /// This method must not fail. If creating a mirror is fallible, keep trying until success
    fn random(rng: &mut (impl rand::Rng + ?Sized)) -> Self;
}

/// Ray origins are drawn from this cube, centered on the origin.
pub const MAX_RAY_ORIGIN_COORD: Float = 7.0;

impl<const D: usize> Random for Ray<D> {
    fn random(rng: &mut (impl rand::Rng + ?Sized)) -> Self {
        let origin = rand_vect(rng, MAX_RAY_ORIGIN_COORD);

        loop {
            if let Some(ray) = Ray::try_new(origin, rand_vect(rng, 1.0)) {
                break ray;
            }
        }
    }
}

impl Random for Surface {
    /// Untagged reflective surfaces are most common, a few are tagged, some absorb.
    fn random(rng: &mut (impl rand::Rng + ?Sized)) -> Self {
        let id = rng.gen_bool(0.25).then(|| SurfaceId(rng.gen_range(0..16)));

        let response = if rng.gen_bool(0.1) {
            Response::Absorb
        } else {
            Response::Reflect
        };

        Self { id, response }
    }
}

impl<M: Random> Random for Tagged<M> {
    fn random(rng: &mut (impl rand::Rng + ?Sized)) -> Self {
        Self {
            surface: Surface::random(rng),
            mirror: M::random(rng),
        }
    }
}

impl Random for ReflectorParams {
    fn random(rng: &mut (impl rand::Rng + ?Sized)) -> Self {
        Self {
            bounce_limit: rng.gen_range(0..64),
            far: rng.gen_range(1.0..200.0),
            ..Default::default()
        }
    }
}

/// Between `1` and `max_num_rays - 1` random rays
pub fn random_rays<const D: usize>(
    rng: &mut (impl rand::Rng + ?Sized),
    max_num_rays: usize,
) -> Vec<Ray<D>> {
    let num_rays = rng.gen_range(1..max_num_rays.max(2));

    iter::repeat_with(|| Ray::random(rng))
        .take(num_rays)
        .collect()
}

pub fn random_simulation<const D: usize, M: Mirror<D> + Random>(
    rng: &mut (impl rand::Rng + ?Sized),
) -> (M, Vec<Ray<D>>) {
    const MAX_NUM_RAYS: usize = 32;

    (M::random(rng), random_rays(rng, MAX_NUM_RAYS))
}

pub fn gen_rand_mirrors<T: Random>(n: usize, rng: &mut (impl rand::Rng + ?Sized)) -> Vec<T> {
    iter::repeat_with(|| T::random(rng)).take(n).collect()
}

/// A vector whose coordinates are uniformly distributed in `[-max_coord_mag, max_coord_mag)`
pub fn rand_vect<const D: usize>(
    rng: &mut (impl rand::Rng + ?Sized),
    max_coord_mag: Float,
) -> SVector<Float, D> {
    // the rng generates floats in 0.0..1.0, scale and translate the range accordingly
    SVector::<Float, D>::from_fn(|_, _| (rng.gen::<Float>() - 0.5) * (max_coord_mag.abs() * 2.0))
}
