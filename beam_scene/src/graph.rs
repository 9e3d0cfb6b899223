use super::*;

use core::iter;

/// Index of a node in a [`SceneGraph`]. Only valid for the graph that returned it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Position, rotation and (per-axis) scale of a node relative to its parent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vector3<Float>,
    pub rotation: UnitQuaternion<Float>,
    pub scale: Vector3<Float>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
            scale: Vector3::repeat(1.0),
        }
    }
}

impl Transform {
    #[inline]
    pub fn from_position(position: impl Into<Vector3<Float>>) -> Self {
        Self {
            position: position.into(),
            ..Default::default()
        }
    }

    /// See [`euler_xyz`].
    #[inline]
    #[must_use]
    pub fn with_rotation(mut self, angles: [Float; 3]) -> Self {
        self.rotation = euler_xyz(angles);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_scale(mut self, scale: Float) -> Self {
        self.scale = Vector3::repeat(scale);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_scale_xyz(mut self, scale: impl Into<Vector3<Float>>) -> Self {
        self.scale = scale.into();
        self
    }

    /// `T * R * S`: scale first, then rotate, then translate.
    pub fn matrix(&self) -> Matrix4<Float> {
        Matrix4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Matrix4::new_nonuniform_scaling(&self.scale)
    }
}

/// Euler angles applied about the X, then Y, then Z axis of the rotated frame.
pub fn euler_xyz([x, y, z]: [Float; 3]) -> UnitQuaternion<Float> {
    UnitQuaternion::from_axis_angle(&Vector3::x_axis(), x)
        * UnitQuaternion::from_axis_angle(&Vector3::y_axis(), y)
        * UnitQuaternion::from_axis_angle(&Vector3::z_axis(), z)
}

#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    /// Width, height and depth, centered on the node's origin.
    Box([Float; 3]),
    /// A unit square in the node's XY plane.
    Plane,
    /// A mesh found in a model file.
    Model { path: String, mesh: String },
    Text { content: String, size: Float, depth: Float },
    /// A polyline, rebuilt every frame from the beam's segments.
    Lines,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Light {
    Ambient {
        intensity: Float,
    },
    Point {
        intensity: Float,
        decay: Float,
    },
    Spot {
        intensity: Float,
        decay: Float,
        distance: Float,
        angle: Float,
        penumbra: Float,
        /// World space position the light points at.
        target: Vector3<Float>,
    },
}

impl Light {
    #[inline]
    pub fn intensity(&self) -> Float {
        match *self {
            Self::Ambient { intensity }
            | Self::Point { intensity, .. }
            | Self::Spot { intensity, .. } => intensity,
        }
    }

    #[inline]
    pub fn set_intensity(&mut self, value: Float) {
        match self {
            Self::Ambient { intensity }
            | Self::Point { intensity, .. }
            | Self::Spot { intensity, .. } => *intensity = value,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    Group,
    OrthographicCamera {
        zoom: Float,
    },
    Light(Light),
    Mesh {
        geometry: Geometry,
        material: Option<MaterialId>,
    },
    /// `count` copies of the same mesh, each with its own transform.
    Instances {
        geometry: Geometry,
        material: MaterialId,
        count: usize,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    pub local: Transform,
    pub visible: bool,
    /// Nodes with a higher order are drawn last.
    pub render_order: i32,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[inline]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// A tree of nodes stored in a flat arena.
///
/// Nodes are never removed, so a [`NodeId`] stays valid for the lifetime of its graph.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneGraph {
    nodes: Vec<Node>,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    pub const ROOT: NodeId = NodeId(0);

    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                name: "root".into(),
                kind: NodeKind::Group,
                local: Transform::default(),
                visible: true,
                render_order: 0,
                parent: None,
                children: vec![],
            }],
        }
    }

    /// # Panics
    ///
    /// if `parent` doesn't belong to this graph
    pub fn add(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        kind: NodeKind,
        local: Transform,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        let name = name.into();

        log::trace!("adding node `{name}` ({id:?}) under {parent:?}");

        self.nodes[parent.0].children.push(id);
        self.nodes.push(Node {
            name,
            kind,
            local,
            visible: true,
            render_order: 0,
            parent: Some(parent),
            children: vec![],
        });

        id
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`, the root can't be removed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// The first node named `name`, in insertion order.
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.name == name).map(NodeId)
    }

    /// From `id`'s parent up to the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        iter::successors(self.node(id).parent, |&id| self.node(id).parent)
    }

    /// Depth first, parents before their children, `id` included.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut stack = vec![id];
        let mut out = vec![];

        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.node(id).children.iter().rev());
        }

        out
    }

    /// The transform from `id`'s local space to world space.
    pub fn world_matrix(&self, id: NodeId) -> Matrix4<Float> {
        iter::once(id)
            .chain(self.ancestors(id))
            .fold(Matrix4::identity(), |m, id| self.node(id).local.matrix() * m)
    }

    #[inline]
    pub fn world_position(&self, id: NodeId) -> Vector3<Float> {
        self.world_matrix(id)
            .transform_point(&Point3::origin())
            .coords
    }

    /// A node is drawn only if it and all its ancestors are visible.
    pub fn is_visible(&self, id: NodeId) -> bool {
        iter::once(id)
            .chain(self.ancestors(id))
            .all(|id| self.node(id).visible)
    }
}
