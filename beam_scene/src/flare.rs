use super::*;

/// Scale of every flare instance. The last one sits behind the others.
pub const FLARE_SCALES: [Float; 5] = [0.5, 1.25, 0.75, 1.5, 2.0];

const BACK_INSTANCE_Z: Float = -0.7;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlareInstance {
    pub position: Vector3<Float>,
    pub scale: Float,
}

impl FlareInstance {
    /// Transform relative to the flare node.
    #[inline]
    pub fn transform(&self) -> Transform {
        Transform::from_position(self.position).with_scale(self.scale)
    }
}

/// The lens flare's dots, drawn as instances of a single textured quad.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlareInstances {
    instances: [FlareInstance; FLARE_SCALES.len()],
}

impl Default for FlareInstances {
    fn default() -> Self {
        let mut instances = FLARE_SCALES.map(|scale| FlareInstance {
            position: Vector3::zeros(),
            scale,
        });

        if let Some(back) = instances.last_mut() {
            back.position.z = BACK_INSTANCE_Z;
        }

        Self { instances }
    }
}

impl FlareInstances {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sway every instance in the flare's plane. Depths are left untouched.
    ///
    /// With `s` the instance's scale and `t` the elapsed time in seconds:
    /// - `x = sin(t * s / 2) * s / 8` if `s > 1`, `cos(t * s / 2) * s / 8` otherwise,
    /// - `y = cos(t * s) * s / 5` if `s > 1`, `atan(t * s) * s / 5` otherwise.
    #[must_use]
    pub fn animate(mut self, elapsed: Float) -> Self {
        for FlareInstance { position, scale } in &mut self.instances {
            let s = *scale;
            let (x, y) = if s > 1.0 {
                ((elapsed * s / 2.0).sin(), (elapsed * s).cos())
            } else {
                ((elapsed * s / 2.0).cos(), (elapsed * s).atan())
            };

            position.x = x * s / 8.0;
            position.y = y * s / 5.0;
        }

        self
    }

    #[inline]
    pub fn as_slice(&self) -> &[FlareInstance] {
        &self.instances
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_layout() {
        let flare = FlareInstances::new();
        let scales: Vec<_> = flare.as_slice().iter().map(|i| i.scale).collect();

        assert_eq!(scales, FLARE_SCALES);
        assert_eq!(flare.as_slice()[4].position.z, -0.7);
        assert!(flare.as_slice()[..4].iter().all(|i| i.position == Vector3::zeros()));
    }

    #[test]
    fn test_animation_formulas() {
        let t = 1.3;
        let flare = FlareInstances::new().animate(t);
        let [small, large, .., back] = flare.instances;

        // s = 0.5: cosine and arctangent
        assert!((small.position.x - (t * 0.25).cos() * 0.5 / 8.0).abs() < 1e-12);
        assert!((small.position.y - (t * 0.5).atan() * 0.5 / 5.0).abs() < 1e-12);

        // s = 1.25: sine and cosine
        assert!((large.position.x - (t * 0.625).sin() * 1.25 / 8.0).abs() < 1e-12);
        assert!((large.position.y - (t * 1.25).cos() * 1.25 / 5.0).abs() < 1e-12);

        assert_eq!(back.position.z, -0.7);
    }

    #[test]
    fn test_animation_only_depends_on_time() {
        let a = FlareInstances::new().animate(4.0);
        let b = FlareInstances::new().animate(1.0).animate(4.0);
        assert_eq!(a, b);

        // at t = 0, x = s / 8 for the small ones and 0 for the large ones
        let rest = FlareInstances::new().animate(0.0);
        assert_eq!(rest.as_slice()[0].position.x, 0.5 / 8.0);
        assert_eq!(rest.as_slice()[1].position.x, 0.0);
        assert_eq!(rest.as_slice()[0].position.y, 0.0);
    }
}
