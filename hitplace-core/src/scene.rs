//! Scene graph the placement pipeline writes into

use crate::model::ModelAsset;
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Index of an entity in a [`Scene`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub usize);

/// What an entity draws
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityKind {
    /// Surface indicator ring
    Reticle {
        /// Inner radius in meters
        inner_radius: f32,
        /// Outer radius in meters
        outer_radius: f32,
    },
    /// Axis-aligned cube
    Cube {
        /// Edge length in meters
        size: f32,
    },
    /// A loaded model
    Model(ModelAsset),
}

impl EntityKind {
    /// The default reticle ring
    pub fn reticle() -> Self {
        EntityKind::Reticle {
            inner_radius: 0.08,
            outer_radius: 0.1,
        }
    }
}

/// A node in the scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Entity name
    pub name: String,
    /// Geometry
    pub kind: EntityKind,
    /// World transform
    pub transform: Mat4,
    /// Whether the renderer draws it
    pub visible: bool,
}

impl Entity {
    /// Create a visible entity at the origin
    pub fn new(name: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            name: name.into(),
            kind,
            transform: Mat4::IDENTITY,
            visible: true,
        }
    }

    /// Set the transform
    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    /// Set visibility
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// World position
    pub fn position(&self) -> Vec3 {
        self.transform.w_axis.truncate()
    }
}

/// Mutations the pipeline performs on the host's scene
pub trait SceneGraph {
    /// Insert an entity
    fn add_entity(&mut self, entity: Entity) -> EntityId;

    /// Remove an entity, returning it if it existed
    fn remove_entity(&mut self, id: EntityId) -> Option<Entity>;

    /// Replace an entity's transform. Returns `false` for unknown ids.
    fn set_transform(&mut self, id: EntityId, transform: Mat4) -> bool;

    /// Show or hide an entity. Returns `false` for unknown ids.
    fn set_visible(&mut self, id: EntityId, visible: bool) -> bool;

    /// Swap an entity's geometry. Returns `false` for unknown ids.
    fn set_kind(&mut self, id: EntityId, kind: EntityKind) -> bool;
}

/// Draws a scene once per frame
pub trait Renderer {
    /// Draw the current state of `scene`
    fn render(&mut self, scene: &Scene);
}

/// In-memory scene
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    /// Scene name
    pub name: String,
    slots: Vec<Option<Entity>>,
    /// Named entity lookup
    names: HashMap<String, EntityId>,
}

impl Scene {
    /// Create an empty scene
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slots: Vec::new(),
            names: HashMap::new(),
        }
    }

    /// Get an entity
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    /// Get an entity by name. Later entities shadow earlier ones with the same name.
    pub fn get_by_name(&self, name: &str) -> Option<&Entity> {
        self.names.get(name).and_then(|&id| self.get(id))
    }

    /// Live entities in insertion order
    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|entity| (EntityId(index), entity)))
    }

    /// Number of live entities
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Whether the scene has no entities
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }
}

impl SceneGraph for Scene {
    fn add_entity(&mut self, entity: Entity) -> EntityId {
        let id = EntityId(self.slots.len());
        self.names.insert(entity.name.clone(), id);
        self.slots.push(Some(entity));
        id
    }

    fn remove_entity(&mut self, id: EntityId) -> Option<Entity> {
        let entity = self.slots.get_mut(id.0)?.take()?;
        if self.names.get(&entity.name) == Some(&id) {
            self.names.remove(&entity.name);
        }
        Some(entity)
    }

    fn set_transform(&mut self, id: EntityId, transform: Mat4) -> bool {
        match self.get_mut(id) {
            Some(entity) => {
                entity.transform = transform;
                true
            }
            None => false,
        }
    }

    fn set_visible(&mut self, id: EntityId, visible: bool) -> bool {
        match self.get_mut(id) {
            Some(entity) => {
                entity.visible = visible;
                true
            }
            None => false,
        }
    }

    fn set_kind(&mut self, id: EntityId, kind: EntityKind) -> bool {
        match self.get_mut(id) {
            Some(entity) => {
                entity.kind = kind;
                true
            }
            None => false,
        }
    }
}
