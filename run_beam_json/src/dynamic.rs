use beam::{Mirror, Surface, Tagged};
use beam_json::{map_json_array, serde_json, JsonDes, JsonError, JsonResult, JsonType};
use beam_mirrors::*;

use std::{collections::HashMap, sync::OnceLock};

/// Any mirror a scene file can describe.
pub trait SceneMirror<const D: usize>: Mirror<D> {}

impl<const D: usize, T: Mirror<D> + ?Sized> SceneMirror<D> for T {}

fn boxed<'a, const D: usize, T: SceneMirror<D> + 'a>(mirror: T) -> Box<dyn SceneMirror<D> + 'a> {
    Box::new(mirror)
}

type MirrorDeserializer<const D: usize> =
    fn(&serde_json::Value) -> JsonResult<Box<dyn SceneMirror<D>>>;

fn deserialize_boxed<const D: usize>(
    json: &serde_json::Value,
    deserializers: &HashMap<String, MirrorDeserializer<D>>,
) -> JsonResult<Box<dyn SceneMirror<D>>> {
    let mirror_type = json
        .get("type")
        .ok_or(JsonError::Missing("type"))?
        .as_str()
        .ok_or_else(|| JsonError::invalid("type", "expected a string"))?;

    let data = json.get("data").ok_or(JsonError::Missing("data"))?;

    let deserializer = deserializers
        .get(mirror_type.trim_start_matches("[]"))
        .ok_or_else(|| JsonError::UnknownType(mirror_type.into()))?;

    let mirror = if mirror_type.starts_with("[]") {
        map_json_array::<Vec<_>, _>(data, deserializer).map(boxed)?
    } else {
        deserializer(data)?
    };

    Ok(match json.get("tag") {
        Some(tag) => boxed(Tagged {
            surface: Surface::from_json(tag)?,
            mirror,
        }),
        None => mirror,
    })
}

macro_rules! impl_dynamic_mirror {
    ($dim:literal) => {
        impl JsonDes for Box<dyn SceneMirror<$dim>> {
            /// ```json
            /// {
            ///     "type": "sphere",                          // or "[]sphere" for a list
            ///     "data": ...,                               // layout depends on "type"
            ///     "tag": { "id": 0, "response": "absorb" }   // optional
            /// }
            /// ```
            fn from_json(json: &serde_json::Value) -> JsonResult<Self> {
                static DESERIALIZERS: OnceLock<HashMap<String, MirrorDeserializer<$dim>>> =
                    OnceLock::new();

                #[rustfmt::skip]
                let deserializers = DESERIALIZERS.get_or_init(|| HashMap::from([
                    (
                        // recurse
                        "dynamic".into(),
                        (|json| Box::<dyn SceneMirror<$dim>>::from_json(json))
                            as MirrorDeserializer<$dim>,
                    ),
                    (
                        PlaneMirror::<$dim>::json_type(),
                        |json| PlaneMirror::<$dim>::from_json(json).map(boxed),
                    ),
                    (
                        Simplex::<$dim>::json_type(),
                        |json| Simplex::<$dim>::from_json(json).map(boxed),
                    ),
                    (
                        Sphere::<$dim>::json_type(),
                        |json| Sphere::<$dim>::from_json(json).map(boxed),
                    ),
                    (
                        Cuboid::<$dim>::json_type(),
                        |json| Cuboid::<$dim>::from_json(json).map(boxed),
                    ),
                ]));

                deserialize_boxed(json, deserializers)
            }
        }
    };
}

impl_dynamic_mirror!(2);
impl_dynamic_mirror!(3);
