//! Selection state: nothing, a single object, or an active selection.
//!
//! An active selection is a transient container for two or more objects.
//! It is never part of the scene and never serialized.

use mocko_core::{ObjectId, SceneGraph};
use smallvec::SmallVec;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    None,
    Single(ObjectId),
    /// Multi-object selection, members in selection order.
    Active(SmallVec<[ObjectId; 4]>),
}

impl Selection {
    /// Normalize a list of IDs: zero is `None`, one is `Single`.
    /// Duplicates are dropped, first occurrence wins.
    pub fn from_ids(ids: impl IntoIterator<Item = ObjectId>) -> Self {
        let mut unique: SmallVec<[ObjectId; 4]> = SmallVec::new();
        for id in ids {
            if !unique.contains(&id) {
                unique.push(id);
            }
        }
        match unique.len() {
            0 => Self::None,
            1 => Self::Single(unique[0]),
            _ => Self::Active(unique),
        }
    }

    pub fn ids(&self) -> &[ObjectId] {
        match self {
            Self::None => &[],
            Self::Single(id) => std::slice::from_ref(id),
            Self::Active(ids) => ids,
        }
    }

    pub fn len(&self) -> usize {
        self.ids().len()
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::None)
    }

    /// True for an active (multi-object) selection.
    pub fn is_active_selection(&self) -> bool {
        matches!(self, Self::Active(_))
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.ids().contains(&id)
    }

    /// Add or remove `id` (shift-click).
    pub fn toggle(&self, id: ObjectId) -> Self {
        if self.contains(id) {
            Self::from_ids(self.ids().iter().copied().filter(|other| *other != id))
        } else {
            Self::from_ids(self.ids().iter().copied().chain(std::iter::once(id)))
        }
    }

    /// Drop members that are no longer in the scene.
    pub fn retain_existing(&mut self, graph: &SceneGraph) {
        if self.ids().iter().all(|id| graph.contains(*id)) {
            return;
        }
        *self = Self::from_ids(self.ids().iter().copied().filter(|id| graph.contains(*id)));
    }
}
