use super::*;

/// Intensity of the rainbow while the prism is lit, once it has settled.
pub const LIT_INTENSITY: Float = 2.5;
/// Intensity of the rainbow right when the beam starts touching the prism.
pub const FLASH_INTENSITY: Float = 20.0;
/// Fraction of the remaining gap closed every frame.
pub const FADE_SPEED: Float = 0.1;

/// Moves `current` towards `target` by `t` times the distance between them.
#[inline]
pub fn lerp(current: Float, target: Float, t: Float) -> Float {
    current + (target - current) * t
}

/// What the beam did to the prism during a cast.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PrismEvent {
    /// The beam started touching the prism.
    Over,
    /// The beam touched the prism at `position`, travelling along `direction`.
    Move {
        position: Vector3<Float>,
        direction: Vector3<Float>,
    },
    /// The beam stopped touching the prism.
    Out,
}

/// Everything that happened since the last frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameInput {
    pub events: Vec<PrismEvent>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RainbowState {
    pub position: Vector3<Float>,
    pub rotation_z: Float,
    pub emissive_intensity: Float,
    pub speed: Float,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlareState {
    pub position: Vector3<Float>,
    pub rotation_z: Float,
    pub visible: bool,
    pub instances: FlareInstances,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpotState {
    pub intensity: Float,
    pub target: Vector3<Float>,
}

/// The animated part of the prism scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneState {
    pub prism_hit: bool,
    pub rainbow: RainbowState,
    pub flare: FlareState,
    pub spot: SpotState,
}

impl Default for SceneState {
    fn default() -> Self {
        Self {
            prism_hit: false,
            rainbow: RainbowState {
                position: Vector3::zeros(),
                rotation_z: 0.0,
                emissive_intensity: 0.0,
                speed: 0.0,
            },
            flare: FlareState {
                position: Vector3::zeros(),
                rotation_z: 0.0,
                visible: false,
                instances: FlareInstances::new(),
            },
            spot: SpotState {
                intensity: core::f64::consts::PI,
                target: Vector3::zeros(),
            },
        }
    }
}

/// Advances the scene by one frame. `elapsed` is the time since the animation
/// started, in seconds.
///
/// Events are applied in order, then the rainbow fades towards its resting
/// intensity and the spot light follows it. The flare only moves while visible.
pub fn update(mut state: SceneState, input: &FrameInput, elapsed: Float) -> SceneState {
    for event in &input.events {
        match *event {
            PrismEvent::Over => {
                state.prism_hit = true;
                state.rainbow.speed = 1.0;
                state.rainbow.emissive_intensity = FLASH_INTENSITY;
            }
            PrismEvent::Move {
                position: p,
                direction,
            } => {
                state.flare.position = Vector3::new(p.x, p.y, -0.5);
                state.flare.rotation_z = -direction.x.atan2(direction.y);

                state.rainbow.rotation_z = 0.0;
                state.rainbow.position = Vector3::new(p.x + 0.5, p.y - 0.5, 0.0);

                state.spot.target = Vector3::new(p.x + 1.0, p.y - 1.0, 0.0);
            }
            PrismEvent::Out => state.prism_hit = false,
        }
    }

    let target = if state.prism_hit { LIT_INTENSITY } else { 0.0 };
    state.rainbow.emissive_intensity = lerp(state.rainbow.emissive_intensity, target, FADE_SPEED);
    state.spot.intensity = state.rainbow.emissive_intensity;

    state.flare.visible = state.prism_hit;
    // a hidden flare stays frozen where it was last drawn
    if state.flare.visible {
        state.flare.instances = state.flare.instances.animate(elapsed);
    }

    state
}
