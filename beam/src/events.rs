use super::*;

use alloc::collections::BTreeSet;
use arrayvec::ArrayVec;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RayEvent {
    /// The beam started touching a surface it didn't touch during the previous cast.
    Over(SurfaceId),
    /// The beam touched a surface (again) during the current cast.
    Move(SurfaceId),
    /// The beam touched a surface during the previous cast, but not this one.
    Out(SurfaceId),
}

impl RayEvent {
    #[inline]
    pub fn surface(&self) -> SurfaceId {
        match *self {
            Self::Over(id) | Self::Move(id) | Self::Out(id) => id,
        }
    }
}

/// Tracks which tagged surfaces the beam touches from one cast to the next.
///
/// Feed it every [`Hit`] of a cast with [`observe`](Self::observe),
/// then call [`finish_cast`](Self::finish_cast) once the cast is over.
#[derive(Clone, Debug, Default)]
pub struct RayEvents {
    hovered: BTreeSet<SurfaceId>,
    current: BTreeSet<SurfaceId>,
}

impl RayEvents {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `Over` followed by `Move` the first time a surface is touched,
    /// `Move` alone afterwards, and nothing for untagged surfaces.
    pub fn observe<const D: usize>(&mut self, hit: &Hit<D>) -> ArrayVec<RayEvent, 2> {
        let mut events = ArrayVec::new();

        if let Some(id) = hit.surface.id {
            if self.current.insert(id) && !self.hovered.contains(&id) {
                events.push(RayEvent::Over(id));
            }
            events.push(RayEvent::Move(id));
        }

        events
    }

    /// Ends the current cast, returning an `Out` event for every surface that
    /// stopped being touched.
    pub fn finish_cast(&mut self) -> Vec<RayEvent> {
        let previous = mem::replace(&mut self.hovered, mem::take(&mut self.current));

        previous
            .into_iter()
            .filter(|id| !self.hovered.contains(id))
            .map(RayEvent::Out)
            .collect()
    }

    /// Whether the beam touched `id` during the last finished cast.
    #[inline]
    pub fn is_hovered(&self, id: SurfaceId) -> bool {
        self.hovered.contains(&id)
    }
}
