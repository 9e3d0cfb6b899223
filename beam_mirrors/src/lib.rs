mod cuboid;
mod plane;
mod simplex;
mod sphere;

pub use cuboid::*;
pub use plane::*;
pub use simplex::*;
pub use sphere::*;

use beam::nalgebra::{SMatrix, SVector, Unit};
use beam::*;
use beam_json::*;
use beam_random::*;

/// Mirrors generated with [`Random`] are centered in a cube of this half-size around the origin.
pub const MAX_MIRROR_COORD: Float = 8.0;

/// Reads `json[field]` as an array of exactly `out.len()` vectors of dimension `D`.
fn read_vectors<const D: usize>(
    json: &serde_json::Value,
    field: &'static str,
    out: &mut [SVector<Float, D>],
) -> JsonResult<()> {
    let values = json
        .get(field)
        .ok_or(JsonError::Missing(field))?
        .as_array()
        .filter(|values| values.len() == out.len())
        .ok_or_else(|| JsonError::invalid(field, "wrong number of vectors"))?;

    for (value, vector) in values.iter().zip(out) {
        *vector = value
            .as_array()
            .and_then(|array| json_array_to_vector(array))
            .ok_or_else(|| JsonError::invalid(field, "expected arrays of D numbers"))?;
    }

    Ok(())
}
