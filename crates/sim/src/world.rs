//! Mock 世界
//!
//! 维护 actor 集合，支持按恒定速度推进，用于测试和无 CARLA 环境的运行。

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use contracts::{
    ActorConfig, ActorId, ActorList, ActorSnapshot, MapContext, RssSensorBlueprint, Transform,
    WorldAccess,
};
use tracing::trace;

/// Mock 世界
///
/// actor 按 id 有序返回。
pub struct MockWorld {
    map: MapContext,
    actors: Mutex<BTreeMap<ActorId, ActorSnapshot>>,
}

impl MockWorld {
    /// 创建空世界
    pub fn new(map: impl Into<String>) -> Self {
        Self {
            map: MapContext::new(map),
            actors: Mutex::new(BTreeMap::new()),
        }
    }

    /// 根据配置的 actor 列表创建世界
    pub fn with_actors<'a>(map: impl Into<String>, actors: impl IntoIterator<Item = &'a ActorConfig>) -> Self {
        let world = Self::new(map);
        for actor in actors {
            world.add_actor(actor.to_snapshot());
        }
        world
    }

    /// 根据 blueprint 创建世界
    pub fn from_blueprint(blueprint: &RssSensorBlueprint) -> Self {
        Self::with_actors(blueprint.world.map.clone(), &blueprint.actors)
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<ActorId, ActorSnapshot>> {
        self.actors.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 添加或替换 actor
    pub fn add_actor(&self, actor: ActorSnapshot) {
        self.lock().insert(actor.id, actor);
    }

    /// 移除 actor，返回被移除的快照
    pub fn remove_actor(&self, actor_id: ActorId) -> Option<ActorSnapshot> {
        self.lock().remove(&actor_id)
    }

    /// 设置 actor 位姿；actor 不存在时返回 false
    pub fn set_transform(&self, actor_id: ActorId, transform: Transform) -> bool {
        match self.lock().get_mut(&actor_id) {
            Some(actor) => {
                actor.transform = transform;
                true
            }
            None => false,
        }
    }

    pub fn actor_count(&self) -> usize {
        self.lock().len()
    }

    /// 按各自速度推进所有 actor
    pub fn advance(&self, delta_seconds: f64) {
        let mut actors = self.lock();
        for actor in actors.values_mut() {
            let location = &mut actor.transform.location;
            location.x += actor.velocity.x * delta_seconds;
            location.y += actor.velocity.y * delta_seconds;
            location.z += actor.velocity.z * delta_seconds;
        }
        trace!(actors = actors.len(), delta_seconds, "mock world advanced");
    }
}

impl WorldAccess for MockWorld {
    fn map(&self) -> MapContext {
        self.map.clone()
    }

    fn actors(&self) -> ActorList {
        self.lock().values().cloned().collect()
    }

    fn actor_transform(&self, actor_id: ActorId) -> Option<Transform> {
        self.lock().get(&actor_id).map(|actor| actor.transform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Vector3;

    #[test]
    fn test_actors_sorted_by_id() {
        let world = MockWorld::new("Town04");
        world.add_actor(ActorSnapshot::new(9, "vehicle.audi.tt", Transform::default()));
        world.add_actor(ActorSnapshot::new(3, "vehicle.tesla.model3", Transform::default()));

        assert_eq!(world.actors().ids(), vec![3, 9]);
        assert_eq!(world.map().name, "Town04");
    }

    #[test]
    fn test_advance_moves_by_velocity() {
        let world = MockWorld::new("Town04");
        let mut actor = ActorSnapshot::new(1, "vehicle.tesla.model3", Transform::at(0.0, 0.0, 0.0));
        actor.velocity = Vector3 {
            x: 10.0,
            y: -2.0,
            z: 0.0,
        };
        world.add_actor(actor);

        world.advance(0.5);

        let location = world.actor_transform(1).unwrap().location;
        assert!((location.x - 5.0).abs() < 1e-9);
        assert!((location.y + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_removed_actor_has_no_transform() {
        let world = MockWorld::new("Town04");
        world.add_actor(ActorSnapshot::new(1, "vehicle.tesla.model3", Transform::at(1.0, 0.0, 0.0)));
        assert!(world.set_transform(1, Transform::at(2.0, 0.0, 0.0)));

        assert!(world.remove_actor(1).is_some());
        assert!(world.actor_transform(1).is_none());
        assert!(!world.set_transform(1, Transform::default()));
        assert_eq!(world.actor_count(), 0);
    }

    #[test]
    fn test_from_blueprint() {
        let mut bp = RssSensorBlueprint::minimal("rss", "Town10HD");
        bp.actors.push(ActorConfig {
            id: 5,
            type_id: "vehicle.lincoln.mkz".into(),
            transform: Transform::at(3.0, 0.0, 0.0),
            velocity: Vector3::default(),
        });

        let world = MockWorld::from_blueprint(&bp);
        assert_eq!(world.map().name, "Town10HD");
        assert_eq!(world.actor_transform(5), Some(Transform::at(3.0, 0.0, 0.0)));
    }
}
