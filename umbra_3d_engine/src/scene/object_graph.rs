/// ObjectGraph - arena of transform nodes with memoized world matrices.
///
/// Nodes live in a SlotMap and are addressed by generational `ObjectKey`s.
/// Deleting a node invalidates its key: every later call with that key
/// returns `Error::InvalidHandle`.
///
/// Cache validity is tracked with integers, never by comparing floats:
/// - every effective mutation bumps the node's `local_version`
/// - every world-matrix recompute is stamped with a fresh value from a
///   graph-wide monotonic clock
/// - a cached world matrix is valid iff the node's `local_version` and the
///   parent's world stamp both equal the values it was computed from
///
/// All caches sit behind `Cell`, so getters take `&self`. The graph is meant
/// for a single render thread and is therefore `!Sync`.

use std::cell::Cell;
use glam::{Mat4, Quat, Vec3};
use slotmap::{new_key_type, SlotMap};
use crate::error::Result;
use crate::engine_handle_err;

new_key_type! {
    /// Stable generational handle to an object in an `ObjectGraph`
    pub struct ObjectKey;
}

/// Memoized world transform of one node
#[derive(Debug, Clone, Copy)]
struct WorldCache {
    matrix: Mat4,
    pos: Vec3,
    rot: Quat,
    scale: Vec3,
    local_version: u64,
    parent_stamp: u64,
    stamp: u64,
}

/// A transform node
///
/// Fields are private; mutate through `ObjectGraph` so versions stay correct.
#[derive(Debug)]
pub struct EngineObject {
    relative_pos: Vec3,
    relative_rot: Quat,
    relative_scale: Vec3,
    parent: Option<ObjectKey>,
    children: Vec<ObjectKey>,
    local_version: u64,
    world_cache: Cell<Option<WorldCache>>,
    normal_cache: Cell<Option<(u64, Mat4)>>,
}

impl EngineObject {
    fn new(pos: Vec3, rot: Quat, scale: Vec3) -> Self {
        Self {
            relative_pos: pos,
            relative_rot: rot,
            relative_scale: scale,
            parent: None,
            children: Vec::new(),
            local_version: 0,
            world_cache: Cell::new(None),
            normal_cache: Cell::new(None),
        }
    }

    pub fn relative_pos(&self) -> Vec3 {
        self.relative_pos
    }

    pub fn relative_rot(&self) -> Quat {
        self.relative_rot
    }

    pub fn relative_scale(&self) -> Vec3 {
        self.relative_scale
    }

    pub fn parent(&self) -> Option<ObjectKey> {
        self.parent
    }

    pub fn children(&self) -> &[ObjectKey] {
        &self.children
    }

    /// Counter bumped on every effective change of this node's own inputs
    pub fn local_version(&self) -> u64 {
        self.local_version
    }

    /// `T(relative_pos) · R(relative_rot) · S(relative_scale)`
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            self.relative_scale,
            self.relative_rot,
            self.relative_pos,
        )
    }

    fn bump(&mut self) {
        self.local_version += 1;
    }
}

/// Arena of `EngineObject`s forming a transform hierarchy
#[derive(Debug, Default)]
pub struct ObjectGraph {
    objects: SlotMap<ObjectKey, EngineObject>,
    clock: Cell<u64>,
}

impl ObjectGraph {
    pub fn new() -> Self {
        Self {
            objects: SlotMap::with_key(),
            clock: Cell::new(0),
        }
    }

    // ===== LIFECYCLE =====

    /// Create a root object
    pub fn create_object(&mut self, pos: Vec3, rot: Quat, scale: Vec3) -> ObjectKey {
        self.objects.insert(EngineObject::new(pos, rot, scale))
    }

    /// Create an object attached to `parent`
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidHandle` if `parent` is stale.
    pub fn create_object_with_parent(
        &mut self,
        parent: ObjectKey,
        pos: Vec3,
        rot: Quat,
        scale: Vec3,
    ) -> Result<ObjectKey> {
        self.get(parent)?;
        let mut object = EngineObject::new(pos, rot, scale);
        object.parent = Some(parent);
        let key = self.objects.insert(object);
        if let Some(parent_object) = self.objects.get_mut(parent) {
            parent_object.children.push(key);
        }
        Ok(key)
    }

    /// Delete an object together with its subtree
    ///
    /// The object is detached from its parent first. Keys of every removed
    /// node become stale.
    pub fn delete(&mut self, key: ObjectKey) -> Result<()> {
        let parent = self.get(key)?.parent;
        if let Some(parent_object) = parent.and_then(|p| self.objects.get_mut(p)) {
            parent_object.children.retain(|&child| child != key);
        }

        let mut pending = vec![key];
        while let Some(current) = pending.pop() {
            if let Some(object) = self.objects.remove(current) {
                pending.extend(object.children);
            }
        }

        crate::engine_trace!("umbra3d::ObjectGraph", "Deleted object {:?} and its subtree", key);
        Ok(())
    }

    /// True while `key` refers to a live object
    pub fn contains(&self, key: ObjectKey) -> bool {
        self.objects.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Iterate over live keys (unspecified order)
    pub fn keys(&self) -> impl Iterator<Item = ObjectKey> + '_ {
        self.objects.keys()
    }

    /// Borrow a node
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidHandle` (and logs it) if `key` is stale.
    pub fn get(&self, key: ObjectKey) -> Result<&EngineObject> {
        self.objects.get(key).ok_or_else(|| {
            engine_handle_err!(
                "umbra3d::ObjectGraph",
                "Object {:?} was deleted or never existed",
                key
            )
        })
    }

    fn get_mut(&mut self, key: ObjectKey) -> Result<&mut EngineObject> {
        self.objects.get_mut(key).ok_or_else(|| {
            engine_handle_err!(
                "umbra3d::ObjectGraph",
                "Object {:?} was deleted or never existed",
                key
            )
        })
    }

    // ===== RELATIVE TRANSFORM =====

    pub fn relative_pos(&self, key: ObjectKey) -> Result<Vec3> {
        Ok(self.get(key)?.relative_pos)
    }

    pub fn relative_rot(&self, key: ObjectKey) -> Result<Quat> {
        Ok(self.get(key)?.relative_rot)
    }

    pub fn relative_scale(&self, key: ObjectKey) -> Result<Vec3> {
        Ok(self.get(key)?.relative_scale)
    }

    /// Set the position relative to the parent
    ///
    /// Writing the current value leaves the version untouched.
    pub fn set_relative_pos(&mut self, key: ObjectKey, pos: Vec3) -> Result<()> {
        let object = self.get_mut(key)?;
        if object.relative_pos != pos {
            object.relative_pos = pos;
            object.bump();
        }
        Ok(())
    }

    /// Set the rotation relative to the parent
    pub fn set_relative_rot(&mut self, key: ObjectKey, rot: Quat) -> Result<()> {
        let object = self.get_mut(key)?;
        if object.relative_rot != rot {
            object.relative_rot = rot;
            object.bump();
        }
        Ok(())
    }

    /// Set the scale relative to the parent
    pub fn set_relative_scale(&mut self, key: ObjectKey, scale: Vec3) -> Result<()> {
        let object = self.get_mut(key)?;
        if object.relative_scale != scale {
            object.relative_scale = scale;
            object.bump();
        }
        Ok(())
    }

    /// Local matrix built from the relative fields only
    pub fn local_matrix(&self, key: ObjectKey) -> Result<Mat4> {
        Ok(self.get(key)?.local_matrix())
    }

    // ===== HIERARCHY =====

    pub fn parent(&self, key: ObjectKey) -> Result<Option<ObjectKey>> {
        Ok(self.get(key)?.parent)
    }

    pub fn children(&self, key: ObjectKey) -> Result<&[ObjectKey]> {
        Ok(self.get(key)?.children.as_slice())
    }

    /// Move `key` under `new_parent` (or to the root with `None`)
    ///
    /// Keeps the relative transform, so the absolute transform follows the
    /// new parent.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidHandle` if either key is stale, if an object
    /// would become its own parent, or if `new_parent` is a descendant of `key`.
    pub fn set_parent(&mut self, key: ObjectKey, new_parent: Option<ObjectKey>) -> Result<()> {
        let old_parent = self.get(key)?.parent;

        if let Some(parent) = new_parent {
            self.get(parent)?;
            if parent == key {
                return Err(engine_handle_err!(
                    "umbra3d::ObjectGraph",
                    "Object {:?} cannot be its own parent",
                    key
                ));
            }
            let mut ancestor = self.get(parent)?.parent;
            while let Some(current) = ancestor {
                if current == key {
                    return Err(engine_handle_err!(
                        "umbra3d::ObjectGraph",
                        "Parenting {:?} under its descendant {:?} would create a cycle",
                        key,
                        parent
                    ));
                }
                ancestor = self.get(current)?.parent;
            }
        }

        if old_parent == new_parent {
            return Ok(());
        }

        if let Some(old) = old_parent.and_then(|p| self.objects.get_mut(p)) {
            old.children.retain(|&child| child != key);
        }
        if let Some(new) = new_parent.and_then(|p| self.objects.get_mut(p)) {
            new.children.push(key);
        }

        let object = self.get_mut(key)?;
        object.parent = new_parent;
        object.bump();
        Ok(())
    }

    // ===== ABSOLUTE TRANSFORM =====

    /// Absolute position
    ///
    /// A root returns its relative position directly. A child returns
    /// `parent_world · (relative_pos, 1)`, memoized with the world matrix.
    pub fn pos(&self, key: ObjectKey) -> Result<Vec3> {
        let object = self.get(key)?;
        if object.parent.is_none() {
            return Ok(object.relative_pos);
        }
        Ok(self.world_entry(key)?.pos)
    }

    /// Absolute rotation: `parent.rot() · relative_rot`
    pub fn rot(&self, key: ObjectKey) -> Result<Quat> {
        let object = self.get(key)?;
        match object.parent {
            Some(parent) => Ok(self.rot(parent)? * object.relative_rot),
            None => Ok(object.relative_rot),
        }
    }

    /// Absolute scale: `relative_scale * parent.scale()` component-wise
    pub fn scale(&self, key: ObjectKey) -> Result<Vec3> {
        let object = self.get(key)?;
        match object.parent {
            Some(parent) => Ok(object.relative_scale * self.scale(parent)?),
            None => Ok(object.relative_scale),
        }
    }

    /// World matrix `T(pos) · R(rot) · S(scale)`
    pub fn world_matrix(&self, key: ObjectKey) -> Result<Mat4> {
        Ok(self.world_entry(key)?.matrix)
    }

    /// Clock stamp of the current world matrix
    ///
    /// Unchanged between two calls iff the world matrix was served from cache.
    pub fn world_version(&self, key: ObjectKey) -> Result<u64> {
        Ok(self.world_entry(key)?.stamp)
    }

    /// Normal matrix `transpose(inverse(world))`, cached against the world stamp
    pub fn normal_matrix(&self, key: ObjectKey) -> Result<Mat4> {
        let world = self.world_entry(key)?;
        let object = self.get(key)?;
        if let Some((stamp, matrix)) = object.normal_cache.get() {
            if stamp == world.stamp {
                return Ok(matrix);
            }
        }
        let matrix = world.matrix.inverse().transpose();
        object.normal_cache.set(Some((world.stamp, matrix)));
        Ok(matrix)
    }

    /// Resolve the world cache of `key`, recomputing along the parent chain
    /// where versions or stamps moved
    fn world_entry(&self, key: ObjectKey) -> Result<WorldCache> {
        let object = self.get(key)?;
        let parent_entry = match object.parent {
            Some(parent) => Some(self.world_entry(parent)?),
            None => None,
        };
        let parent_stamp = parent_entry.map_or(0, |entry| entry.stamp);

        if let Some(cached) = object.world_cache.get() {
            if cached.local_version == object.local_version && cached.parent_stamp == parent_stamp {
                return Ok(cached);
            }
        }

        let (pos, rot, scale) = match parent_entry {
            Some(parent) => (
                parent.matrix.transform_point3(object.relative_pos),
                parent.rot * object.relative_rot,
                object.relative_scale * parent.scale,
            ),
            None => (object.relative_pos, object.relative_rot, object.relative_scale),
        };

        let entry = WorldCache {
            matrix: Mat4::from_scale_rotation_translation(scale, rot, pos),
            pos,
            rot,
            scale,
            local_version: object.local_version,
            parent_stamp,
            stamp: self.tick(),
        };
        object.world_cache.set(Some(entry));
        Ok(entry)
    }

    fn tick(&self) -> u64 {
        let next = self.clock.get() + 1;
        self.clock.set(next);
        next
    }
}

#[cfg(test)]
#[path = "object_graph_tests.rs"]
mod tests;
