//! Body mutations requested while the world is locked.

use glam::Vec2;

use crate::backend::BodyHandle;

/// Pending structural changes, applied after the running step returns.
///
/// Requests keep the order they first arrived in. Per body, the last
/// position and the last rotation written win.
#[derive(Debug, Default)]
pub struct MutationQueue {
    destroys: Vec<BodyHandle>,
    positions: Vec<(BodyHandle, Vec2)>,
    rotations: Vec<(BodyHandle, f32)>,
}

/// Everything that was queued, in application order.
#[derive(Debug, Default, PartialEq)]
pub struct MutationBatch {
    pub destroys: Vec<BodyHandle>,
    pub positions: Vec<(BodyHandle, Vec2)>,
    pub rotations: Vec<(BodyHandle, f32)>,
}

fn upsert<T>(entries: &mut Vec<(BodyHandle, T)>, body: BodyHandle, value: T) {
    match entries.iter_mut().find(|(handle, _)| *handle == body) {
        Some(entry) => entry.1 = value,
        None => entries.push((body, value)),
    }
}

impl MutationQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn destroy(&mut self, body: BodyHandle) {
        if !self.destroys.contains(&body) {
            self.destroys.push(body);
        }
    }

    pub fn set_position(&mut self, body: BodyHandle, position: Vec2) {
        upsert(&mut self.positions, body, position);
    }

    pub fn set_rotation(&mut self, body: BodyHandle, angle: f32) {
        upsert(&mut self.rotations, body, angle);
    }

    /// Returns `true` if `body` will be destroyed at the next drain.
    #[must_use]
    pub fn is_destroy_pending(&self, body: BodyHandle) -> bool {
        self.destroys.contains(&body)
    }

    /// Bodies waiting to be destroyed. They stay pending until [`drain`](Self::drain).
    #[must_use]
    pub fn pending_destroys(&self) -> &[BodyHandle] {
        &self.destroys
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.destroys.is_empty() && self.positions.is_empty() && self.rotations.is_empty()
    }

    /// Take all queued requests: destroys, then positions, then rotations.
    pub fn drain(&mut self) -> MutationBatch {
        MutationBatch {
            destroys: std::mem::take(&mut self.destroys),
            positions: std::mem::take(&mut self.positions),
            rotations: std::mem::take(&mut self.rotations),
        }
    }
}
