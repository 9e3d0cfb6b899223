use super::*;

use beam::nalgebra::Matrix3;
use beam_mirrors::Cuboid;
use core::f64::consts::{FRAC_PI_2, PI};

/// The tag carried by both of the prism's hitboxes.
pub const PRISM: SurfaceId = SurfaceId(0);

pub const BOUNCE_LIMIT: usize = 10;
pub const FAR: Float = 20.0;
/// Room for every bounce, the final leg, and the extension to the prism's center.
pub const BEAM_CAPACITY: usize = BOUNCE_LIMIT + 2;

const CAMERA_ZOOM: Float = 70.0;
const HITBOX_ROTATION: [Float; 3] = [FRAC_PI_2, PI, 0.0];
const HITBOX_SCALE: Float = 1.9;

/// The nodes the frame loop writes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrismNodes {
    pub camera: NodeId,
    pub spot: NodeId,
    pub beam: NodeId,
    pub prism: NodeId,
    /// Both receive the beam, the first one is invisible
    pub hitboxes: [NodeId; 2],
    pub rainbow: NodeId,
    pub flare: NodeId,
    pub flare_dots: NodeId,
}

/// What happened during a call to [`PrismScene::tick`].
#[derive(Clone, Debug, PartialEq)]
pub struct FrameReport {
    pub termination: Termination,
    pub events: Vec<PrismEvent>,
}

/// A beam falling from the top of the viewport onto a prism.
///
/// The prism stops the beam, which is then extended to the prism's center.
/// While it is lit, a rainbow glows next to the impact point, a lens flare sits
/// on it and a spot light follows it.
#[derive(Clone, Debug)]
pub struct PrismScene {
    graph: SceneGraph,
    assets: Assets,
    nodes: PrismNodes,
    rainbow_material: MaterialId,
    hitboxes: [Tagged<Cuboid<3>>; 2],
    reflector: Reflector<3>,
    events: RayEvents,
    state: SceneState,
}

/// The box a `Geometry::Box` mesh occupies in world space.
pub fn world_box(graph: &SceneGraph, id: NodeId) -> Result<Cuboid<3>, SceneError> {
    let node = graph.node(id);

    let NodeKind::Mesh {
        geometry: Geometry::Box(size),
        ..
    } = &node.kind
    else {
        return Err(SceneError::NotABox(node.name.clone()));
    };

    let m = graph.world_matrix(id);
    let linear = m.fixed_view::<3, 3>(0, 0);
    let center = m.fixed_view::<3, 1>(0, 3).into_owned();

    let mut axes = Matrix3::zeros();
    let mut half_extents = Vector3::zeros();

    for (i, &side) in size.iter().enumerate() {
        let column = linear.column(i);
        let scale = column.norm();

        axes.set_column(i, &(column / scale));
        half_extents[i] = side * scale / 2.0;
    }

    // fails when a parent's non-uniform scale shears the box
    Cuboid::try_new(center, half_extents, axes)
        .ok_or_else(|| SceneError::DegenerateHitbox(node.name.clone()))
}

impl PrismScene {
    pub fn new() -> Result<Self, SceneError> {
        let mut assets = Assets::new();
        let mut graph = SceneGraph::new();
        let root = SceneGraph::ROOT;

        let caption_material = assets.add("caption", Material::default())?;
        let beam_material = assets.add("beam", Material::default())?;
        let label_material =
            assets.add("prism_label", Material::textured("/product-overview.jpg"))?;
        let glass_material = assets.add(
            "prism_glass",
            Material {
                color: rgb_hex(0x888888),
                metalness: 1.2,
                roughness: 0.3,
                opacity: 0.2,
                transparent: true,
                ..Default::default()
            },
        )?;
        let rainbow_material = assets.add("rainbow", Material::default())?;
        let dot_material =
            assets.add("flare_dot", Material::glow("/textures/lensflare/lensflare3.png"))?;
        let glow_material = assets.add(
            "flare_glow",
            Material::glow("/textures/lensflare/lensflare0_bw.png"),
        )?;
        let streak_material =
            assets.add("flare_streak", Material::glow("/textures/lensflare/lensflare2.png"))?;

        let camera = graph.add(
            root,
            "camera",
            NodeKind::OrthographicCamera { zoom: CAMERA_ZOOM },
            Transform::from_position([0., 0., 100.]),
        );

        graph.add(
            root,
            "ambient",
            NodeKind::Light(Light::Ambient { intensity: 2.0 }),
            Transform::default(),
        );

        for (name, position) in [
            ("point_right", [10., -10., 0.]),
            ("point_top", [0., 10., 0.]),
            ("point_left", [-10., 0., 0.]),
        ] {
            graph.add(
                root,
                name,
                NodeKind::Light(Light::Point {
                    intensity: 1.05 * PI,
                    decay: 0.0,
                }),
                Transform::from_position(position),
            );
        }

        let spot = graph.add(
            root,
            "spot",
            NodeKind::Light(Light::Spot {
                intensity: PI,
                decay: 0.0,
                distance: 7.0,
                angle: 1.0,
                penumbra: 1.0,
                target: Vector3::zeros(),
            }),
            Transform::from_position([0., 0., 1.]),
        );

        graph.add(
            root,
            "caption",
            NodeKind::Mesh {
                geometry: Geometry::Text {
                    content: "Dark side of the Moon".into(),
                    size: 0.7,
                    depth: 0.05,
                },
                material: Some(caption_material),
            },
            Transform::from_position([0., 2., 0.]),
        );

        let beam = graph.add(
            root,
            "beam",
            NodeKind::Mesh {
                geometry: Geometry::Lines,
                material: Some(beam_material),
            },
            Transform::default(),
        );

        let prism = graph.add(
            beam,
            "prism",
            NodeKind::Group,
            Transform::from_position([0., -3., 0.]),
        );

        let hitbox_transform = Transform::default()
            .with_rotation(HITBOX_ROTATION)
            .with_scale(HITBOX_SCALE);

        let hitbox = graph.add(
            prism,
            "prism_hitbox",
            NodeKind::Mesh {
                geometry: Geometry::Box([2., 1., 1.]),
                material: None,
            },
            hitbox_transform,
        );
        graph.node_mut(hitbox).visible = false;

        let label = graph.add(
            prism,
            "prism_label",
            NodeKind::Mesh {
                geometry: Geometry::Box([2., 0.5, 1.]),
                material: Some(label_material),
            },
            hitbox_transform,
        );

        let glass = graph.add(
            prism,
            "prism_glass",
            NodeKind::Mesh {
                geometry: Geometry::Model {
                    path: "/gltf/x.glb".into(),
                    mesh: "Cube042".into(),
                },
                material: Some(glass_material),
            },
            Transform::from_position([0., 0.5, 0.6]).with_scale(3.),
        );
        graph.node_mut(glass).render_order = 10;

        let rainbow = graph.add(
            root,
            "rainbow",
            NodeKind::Mesh {
                geometry: Geometry::Plane,
                material: Some(rainbow_material),
            },
            Transform::default(),
        );

        let flare = graph.add(
            root,
            "flare",
            NodeKind::Group,
            Transform::default().with_scale(1.25),
        );
        graph.node_mut(flare).render_order = 10;
        graph.node_mut(flare).visible = false;

        let flare_dots = graph.add(
            flare,
            "flare_dots",
            NodeKind::Instances {
                geometry: Geometry::Plane,
                material: dot_material,
                count: FLARE_SCALES.len(),
            },
            Transform::default(),
        );

        graph.add(
            flare,
            "flare_glow",
            NodeKind::Mesh {
                geometry: Geometry::Plane,
                material: Some(glow_material),
            },
            Transform::default(),
        );

        graph.add(
            flare,
            "flare_streak",
            NodeKind::Mesh {
                geometry: Geometry::Plane,
                material: Some(streak_material),
            },
            Transform::default()
                .with_rotation([0., 0., FRAC_PI_2])
                .with_scale_xyz([12.5, 20., 1.]),
        );

        let nodes = PrismNodes {
            camera,
            spot,
            beam,
            prism,
            hitboxes: [hitbox, label],
            rainbow,
            flare,
            flare_dots,
        };

        log::debug!("prism scene: {} nodes, {} materials", graph.len(), assets.len());

        Ok(Self {
            hitboxes: Self::build_hitboxes(&graph, nodes.hitboxes)?,
            graph,
            assets,
            nodes,
            rainbow_material,
            reflector: Reflector::new(
                ReflectorParams {
                    bounce_limit: BOUNCE_LIMIT,
                    far: FAR,
                    ..Default::default()
                },
                BEAM_CAPACITY,
            ),
            events: RayEvents::new(),
            state: SceneState::default(),
        })
    }

    fn build_hitboxes(
        graph: &SceneGraph,
        [hitbox, label]: [NodeId; 2],
    ) -> Result<[Tagged<Cuboid<3>>; 2], SceneError> {
        Ok([
            Tagged::absorbing(PRISM, world_box(graph, hitbox)?),
            Tagged::absorbing(PRISM, world_box(graph, label)?),
        ])
    }

    /// Moves the prism, hitboxes included.
    pub fn set_prism_position(
        &mut self,
        position: impl Into<Vector3<Float>>,
    ) -> Result<(), SceneError> {
        self.graph.node_mut(self.nodes.prism).local.position = position.into();
        self.hitboxes = Self::build_hitboxes(&self.graph, self.nodes.hitboxes)?;
        Ok(())
    }

    /// Casts the beam from the middle of the viewport's top edge, straight down,
    /// then advances the animation. `elapsed` is in seconds.
    pub fn tick(&mut self, viewport_height: Float, elapsed: Float) -> FrameReport {
        let origin = Vector3::new(0.0, viewport_height / 2.0, 0.0);
        let prism_center = self.graph.world_position(self.nodes.prism);

        let events = &mut self.events;
        let mut input = FrameInput::default();

        let termination = self
            .reflector
            .cast(&self.hitboxes, origin, -Vector3::y(), |hit, segments| {
                for event in events.observe(hit) {
                    match event {
                        RayEvent::Over(PRISM) => input.events.push(PrismEvent::Over),
                        RayEvent::Move(PRISM) => {
                            if !segments.extend_to(prism_center) {
                                log::warn!("no room left to extend the beam to the prism");
                            }

                            input.events.push(PrismEvent::Move {
                                position: hit.position,
                                direction: hit.direction.into_inner(),
                            });
                        }
                        _ => {}
                    }
                }
            });

        input.events.extend(
            events
                .finish_cast()
                .into_iter()
                .filter(|&event| event == RayEvent::Out(PRISM))
                .map(|_| PrismEvent::Out),
        );

        let was_hit = self.state.prism_hit;
        self.state = update(self.state, &input, elapsed);

        if was_hit != self.state.prism_hit {
            log::debug!(
                "prism {} at t = {elapsed:.3}s",
                if self.state.prism_hit { "lit" } else { "dark" }
            );
        }

        self.sync_graph();

        FrameReport {
            termination,
            events: input.events,
        }
    }

    /// Copies the animated state into the nodes and materials it drives.
    fn sync_graph(&mut self) {
        let SceneState {
            rainbow,
            flare,
            spot,
            ..
        } = self.state;

        let node = self.graph.node_mut(self.nodes.rainbow);
        node.local.position = rainbow.position;
        node.local.rotation = euler_xyz([0.0, 0.0, rainbow.rotation_z]);

        let material = self.assets.get_mut(self.rainbow_material);
        material.emissive_intensity = rainbow.emissive_intensity;
        material.speed = rainbow.speed;

        let node = self.graph.node_mut(self.nodes.flare);
        node.local.position = flare.position;
        node.local.rotation = euler_xyz([0.0, 0.0, flare.rotation_z]);
        node.visible = flare.visible;

        if let NodeKind::Light(Light::Spot {
            intensity, target, ..
        }) = &mut self.graph.node_mut(self.nodes.spot).kind
        {
            *intensity = spot.intensity;
            *target = spot.target;
        }
    }

    /// The visible height of the world, for a canvas `canvas_height` pixels high.
    pub fn viewport_height(&self, canvas_height: Float) -> Float {
        match self.graph.node(self.nodes.camera).kind {
            NodeKind::OrthographicCamera { zoom } => canvas_height / zoom,
            _ => canvas_height / CAMERA_ZOOM,
        }
    }

    #[inline]
    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    #[inline]
    pub fn assets(&self) -> &Assets {
        &self.assets
    }

    #[inline]
    pub fn nodes(&self) -> &PrismNodes {
        &self.nodes
    }

    #[inline]
    pub fn state(&self) -> &SceneState {
        &self.state
    }

    #[inline]
    pub fn hitboxes(&self) -> &[Tagged<Cuboid<3>>; 2] {
        &self.hitboxes
    }

    /// The beam's path after the last tick.
    #[inline]
    pub fn beam(&self) -> &SegmentBuffer<3> {
        self.reflector.segments()
    }

    /// The beam's path as a line list, ready for a vertex buffer.
    pub fn beam_positions(&self) -> Vec<f32> {
        self.beam().positions()
    }

    /// Transforms of the flare's dots, relative to the flare node.
    pub fn flare_instances(&self) -> impl Iterator<Item = Transform> + '_ {
        self.state
            .flare
            .instances
            .as_slice()
            .iter()
            .map(FlareInstance::transform)
    }
}
