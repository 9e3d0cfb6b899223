//! The prism scene: a beam cast from the top of the viewport onto a prism,
//! lighting up a rainbow, a lens flare and a spot light when it hits.
//!
//! Everything a renderer needs is kept as plain data: a [`SceneGraph`] of
//! nodes, the [`Assets`] they share, and a [`SceneState`] advanced once per
//! frame by the pure [`update`] function.

mod assets;
mod flare;
mod graph;
mod prism;
mod state;

pub use assets::*;
pub use flare::*;
pub use graph::*;
pub use prism::*;
pub use state::*;

use beam::nalgebra::{Matrix4, Point3, UnitQuaternion, Vector3};
use beam::*;

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum SceneError {
    #[error("duplicate material name `{0}`")]
    DuplicateMaterial(String),

    #[error("node `{0}` is not a box and can't be used as a hitbox")]
    NotABox(String),

    #[error("hitbox `{0}` is degenerate")]
    DegenerateHitbox(String),
}
