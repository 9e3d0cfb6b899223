use super::*;

pub const DEFAULT_CAPACITY: usize = 64;

/// Everything needed to build a [`Reflector`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReflectorConfig {
    pub params: ReflectorParams,
    /// Maximum number of segments per cast
    pub capacity: usize,
}

impl Default for ReflectorConfig {
    fn default() -> Self {
        Self {
            params: ReflectorParams::default(),
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl ReflectorConfig {
    pub fn build<const D: usize>(&self) -> Reflector<D> {
        Reflector::new(self.params, self.capacity)
    }
}

fn get_count(json: &serde_json::Value, field: &'static str) -> JsonResult<Option<usize>> {
    json.get(field)
        .map(|value| {
            value
                .as_u64()
                .and_then(|n| n.try_into().ok())
                .ok_or_else(|| JsonError::invalid(field, "expected a non-negative integer"))
        })
        .transpose()
}

fn get_positive(json: &serde_json::Value, field: &'static str) -> JsonResult<Option<Float>> {
    json.get(field)
        .map(|value| {
            value
                .as_f64()
                .filter(|x| x.is_finite() && *x > 0.0)
                .ok_or_else(|| JsonError::invalid(field, "expected a finite, positive number"))
        })
        .transpose()
}

impl JsonSer for ReflectorConfig {
    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "bounce": self.params.bounce_limit,
            "far": self.params.far,
            "eps": self.params.eps,
            "capacity": self.capacity,
        })
    }
}

impl JsonDes for ReflectorConfig {
    /// Every field is optional, missing ones take their default value:
    ///
    /// ```json
    /// {
    ///     "bounce": 10,    // maximum number of reflections
    ///     "far": 20.0,     // maximum travel distance
    ///     "eps": 1e-9,     // minimum distance between two reflections
    ///     "capacity": 64,  // maximum number of segments
    /// }
    /// ```
    fn from_json(json: &serde_json::Value) -> JsonResult<Self> {
        if !json.is_object() {
            return Err(JsonError::invalid("reflector", "expected an object"));
        }

        let mut config = Self::default();

        if let Some(bounce_limit) = get_count(json, "bounce")? {
            config.params.bounce_limit = bounce_limit;
        }

        if let Some(far) = get_positive(json, "far")? {
            config.params.far = far;
        }

        if let Some(eps) = get_positive(json, "eps")? {
            config.params.eps = eps;
        }

        if let Some(capacity) = get_count(json, "capacity")? {
            config.capacity = capacity;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_match_the_prism_scene() {
        let config = ReflectorConfig::from_json(&json!({})).unwrap();

        assert_eq!(config.params.bounce_limit, 10);
        assert_eq!(config.params.far, 20.0);
        assert_eq!(config.capacity, DEFAULT_CAPACITY);
    }

    #[test]
    fn test_partial_override() {
        let config = ReflectorConfig::from_json(&json!({"bounce": 1, "capacity": 3})).unwrap();

        assert_eq!(config.params.bounce_limit, 1);
        assert_eq!(config.capacity, 3);
        assert_eq!(config.params.far, 20.0);
        assert_eq!(config.build::<3>().segments().capacity(), 3);
    }

    #[test]
    fn test_invalid_values() {
        for json in [
            json!({"far": -1.0}),
            json!({"far": "far"}),
            json!({"eps": 0.0}),
            json!({"bounce": -2}),
            json!({"capacity": 1.5}),
            json!([]),
        ] {
            assert!(ReflectorConfig::from_json(&json).is_err(), "{json} was accepted");
        }
    }

    #[test]
    fn test_round_trip() {
        let config = ReflectorConfig {
            params: ReflectorParams {
                bounce_limit: 3,
                far: 7.5,
                eps: 1e-9,
            },
            capacity: 12,
        };

        assert_eq!(ReflectorConfig::from_json(&config.to_json()).unwrap(), config);
    }
}
