use beam::*;
use beam::nalgebra::SVector;

use std::{ops::Deref, rc::Rc, sync::Arc};

pub use serde_json;

mod config;
mod error;

pub use config::*;
pub use error::*;

/// This is essentially `try_into` then `try_map` but the latter is nightly-only
pub fn json_array_to_float_array<const D: usize>(
    json_array: &[serde_json::Value],
) -> Option<[Float; D]> {
    let array: &[serde_json::Value; D] = json_array.try_into().ok()?;

    let mut coords = [0.; D];
    for (coord, value) in coords.iter_mut().zip(array) {
        *coord = value.as_f64()?;
    }
    Some(coords)
}

pub fn json_array_to_vector<const D: usize>(
    json_array: &[serde_json::Value],
) -> Option<SVector<Float, D>> {
    json_array_to_float_array(json_array).map(SVector::from)
}

/// Reads `json[field]` as an array of exactly `D` numbers.
pub fn get_vector<const D: usize>(
    json: &serde_json::Value,
    field: &'static str,
) -> JsonResult<SVector<Float, D>> {
    json.get(field)
        .ok_or(JsonError::Missing(field))?
        .as_array()
        .and_then(|array| json_array_to_vector(array))
        .ok_or_else(|| {
            JsonError::invalid(field, "expected an array of numbers of the right length")
        })
}

pub fn get_float(json: &serde_json::Value, field: &'static str) -> JsonResult<Float> {
    json.get(field)
        .ok_or(JsonError::Missing(field))?
        .as_f64()
        .ok_or_else(|| JsonError::invalid(field, "expected a number"))
}

pub fn map_json_array<C: FromIterator<T>, T>(
    json: &serde_json::Value,
    map: impl FnMut(&serde_json::Value) -> JsonResult<T>,
) -> JsonResult<C> {
    json.as_array()
        .ok_or(JsonError::NotAnArray)?
        .iter()
        .map(map)
        .collect()
}

pub trait JsonType {
    /// Returns a string, unique to the type, found in the "type" field of the json
    /// representation of a "dynamic" mirror containing a mirror of this type
    fn json_type() -> String;
}

impl<T: JsonType> JsonType for [T] {
    fn json_type() -> String {
        format!("[]{}", T::json_type())
    }
}

impl<T: JsonType> JsonType for Vec<T> {
    fn json_type() -> String {
        <[T]>::json_type()
    }
}

pub trait JsonSer {
    /// Serialize `self` into a JSON object.
    fn to_json(&self) -> serde_json::Value;
}

impl<T: JsonSer> JsonSer for [T] {
    fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Array(self.iter().map(T::to_json).collect())
    }
}

impl<const N: usize, T: JsonSer> JsonSer for [T; N] {
    fn to_json(&self) -> serde_json::Value {
        self.as_slice().to_json()
    }
}

// A blanket impl over `Deref` would make the trait unusable downstream

impl<T: JsonSer + ?Sized> JsonSer for Box<T> {
    fn to_json(&self) -> serde_json::Value {
        self.deref().to_json()
    }
}

impl<T: JsonSer + ?Sized> JsonSer for Arc<T> {
    fn to_json(&self) -> serde_json::Value {
        self.deref().to_json()
    }
}

impl<T: JsonSer + ?Sized> JsonSer for Rc<T> {
    fn to_json(&self) -> serde_json::Value {
        self.deref().to_json()
    }
}

impl<T: JsonSer> JsonSer for Vec<T> {
    fn to_json(&self) -> serde_json::Value {
        self.as_slice().to_json()
    }
}

impl<T: JsonSer + ?Sized> JsonSer for &T {
    fn to_json(&self) -> serde_json::Value {
        (*self).to_json()
    }
}

pub trait JsonDes {
    /// Deserialize from a JSON object.
    ///
    /// Returns an error if `json`'s format or values are invalid.
    fn from_json(json: &serde_json::Value) -> JsonResult<Self>
    where
        Self: Sized;
}

impl<T: JsonDes> JsonDes for Vec<T> {
    fn from_json(json: &serde_json::Value) -> JsonResult<Self> {
        map_json_array(json, T::from_json)
    }
}

impl<const D: usize> JsonSer for Ray<D> {
    /// The format of the returned object is explained in [`Self::from_json`]
    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "origin": self.origin.as_slice(),
            "direction": self.direction.as_slice(),
        })
    }
}

impl<const D: usize> JsonDes for Ray<D> {
    /// Deserialize a new ray from a JSON object.
    ///
    /// The JSON object must follow the following format:
    ///
    /// ```json
    /// {
    ///     "origin": [9., 8., 7., ...],    // an array of D floats
    ///     "direction": [9., 8., 7., ...], // D floats, at least one of them non-zero
    /// }
    /// ```
    fn from_json(json: &serde_json::Value) -> JsonResult<Self> {
        let origin = get_vector(json, "origin")?;
        let direction = get_vector(json, "direction")?;

        Ray::try_new(origin, direction)
            .ok_or_else(|| JsonError::invalid("direction", "must be finite and non-zero"))
    }
}

impl JsonSer for Surface {
    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id.map(|SurfaceId(id)| id),
            "response": match self.response {
                Response::Reflect => "reflect",
                Response::Absorb => "absorb",
            },
        })
    }
}

impl JsonDes for Surface {
    /// ```json
    /// {
    ///     "id": 3,               // optional, a non-negative integer
    ///     "response": "absorb",  // optional, "reflect" (default) or "absorb"
    /// }
    /// ```
    fn from_json(json: &serde_json::Value) -> JsonResult<Self> {
        let id = match json.get("id") {
            None | Some(serde_json::Value::Null) => None,
            Some(value) => Some(SurfaceId(
                value
                    .as_u64()
                    .and_then(|id| id.try_into().ok())
                    .ok_or_else(|| JsonError::invalid("id", "expected a 32-bit unsigned integer"))?,
            )),
        };

        let response = match json.get("response").map(serde_json::Value::as_str) {
            None | Some(Some("reflect")) => Response::Reflect,
            Some(Some("absorb")) => Response::Absorb,
            Some(_) => {
                return Err(JsonError::invalid(
                    "response",
                    r#"expected "reflect" or "absorb""#,
                ))
            }
        };

        Ok(Self { id, response })
    }
}

impl<const D: usize> JsonSer for Segment<D> {
    fn to_json(&self) -> serde_json::Value {
        serde_json::json!([self.start.as_slice(), self.end.as_slice()])
    }
}

impl<const D: usize> JsonSer for SegmentBuffer<D> {
    fn to_json(&self) -> serde_json::Value {
        self.as_slice().to_json()
    }
}

/// A mirror, the rays cast into it, and the reflector they are cast with.
#[derive(Clone, Debug)]
pub struct Simulation<M, const D: usize> {
    pub config: ReflectorConfig,
    pub mirror: M,
    pub rays: Vec<Ray<D>>,
}

pub fn serialize_simulation<const D: usize>(
    config: &ReflectorConfig,
    mirror: &(impl JsonSer + ?Sized),
    rays: impl IntoIterator<Item = Ray<D>>,
) -> serde_json::Value {
    serde_json::json!({
        "dim": D,
        "reflector": config.to_json(),
        "mirror": mirror.to_json(),
        "rays": Vec::from_iter(rays.into_iter().map(|ray| ray.to_json())),
    })
}

/// Reads the `"dim"` field of a simulation.
pub fn simulation_dim(json: &serde_json::Value) -> JsonResult<u64> {
    json.get("dim")
        .ok_or(JsonError::Missing("dim"))?
        .as_u64()
        .ok_or_else(|| JsonError::invalid("dim", "expected a positive integer"))
}

/// The `"reflector"` field is optional, see [`ReflectorConfig::from_json`].
pub fn deserialize_simulation<const D: usize, M: JsonDes>(
    json: &serde_json::Value,
) -> JsonResult<Simulation<M, D>> {
    let dim = simulation_dim(json)?;
    if dim != D as u64 {
        return Err(JsonError::Dimension {
            expected: D,
            found: dim,
        });
    }

    let config = json
        .get("reflector")
        .map(ReflectorConfig::from_json)
        .transpose()?
        .unwrap_or_default();

    Ok(Simulation {
        config,
        mirror: M::from_json(json.get("mirror").ok_or(JsonError::Missing("mirror"))?)?,
        rays: map_json_array(
            json.get("rays").ok_or(JsonError::Missing("rays"))?,
            Ray::from_json,
        )?,
    })
}
