//! Actor snapshot types
//!
//! Read-only views of simulation actors handed to the safety evaluator.

use serde::{Deserialize, Serialize};

use crate::{Transform, Vector3};

/// CARLA actor handle type
pub type ActorId = u32;

/// Point-in-time view of one actor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorSnapshot {
    /// Actor handle
    pub id: ActorId,

    /// Blueprint type, e.g. "vehicle.tesla.model3"
    pub type_id: String,

    /// World pose
    pub transform: Transform,

    /// World velocity (m/s)
    #[serde(default)]
    pub velocity: Vector3,
}

impl ActorSnapshot {
    pub fn new(id: ActorId, type_id: impl Into<String>, transform: Transform) -> Self {
        Self {
            id,
            type_id: type_id.into(),
            transform,
            velocity: Vector3::default(),
        }
    }
}

/// Ordered list of actors, as returned by the world
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActorList {
    actors: Vec<ActorSnapshot>,
}

impl ActorList {
    pub fn new(actors: Vec<ActorSnapshot>) -> Self {
        Self { actors }
    }

    /// Keep actors whose `type_id` matches a wildcard pattern (`*`, `?`)
    pub fn filter(&self, pattern: &str) -> ActorList {
        let actors = self
            .actors
            .iter()
            .filter(|actor| wildcard_match(pattern, &actor.type_id))
            .cloned()
            .collect();
        ActorList { actors }
    }

    /// Find an actor by handle
    pub fn find(&self, id: ActorId) -> Option<&ActorSnapshot> {
        self.actors.iter().find(|actor| actor.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActorSnapshot> {
        self.actors.iter()
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    pub fn ids(&self) -> Vec<ActorId> {
        self.actors.iter().map(|actor| actor.id).collect()
    }
}

impl FromIterator<ActorSnapshot> for ActorList {
    fn from_iter<I: IntoIterator<Item = ActorSnapshot>>(iter: I) -> Self {
        Self {
            actors: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ActorList {
    type Item = ActorSnapshot;
    type IntoIter = std::vec::IntoIter<ActorSnapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.actors.into_iter()
    }
}

/// Shell-style wildcard matching as used by CARLA's blueprint filters
///
/// `*` matches any run of characters (including none), `?` exactly one.
pub fn wildcard_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0usize, 0usize);
    // Last `*` seen in the pattern and the text position it was tried against
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == text[t]) {
            p += 1;
            t += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            backtrack = Some((p, t));
            p += 1;
        } else if let Some((star_p, star_t)) = backtrack {
            p = star_p + 1;
            t = star_t + 1;
            backtrack = Some((star_p, star_t + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(id: ActorId, type_id: &str) -> ActorSnapshot {
        ActorSnapshot::new(id, type_id, Transform::default())
    }

    #[test]
    fn test_wildcard_match() {
        assert!(wildcard_match("vehicle.*", "vehicle.tesla.model3"));
        assert!(wildcard_match("vehicle.*", "vehicle."));
        assert!(wildcard_match("*", ""));
        assert!(wildcard_match("walker.pedestrian.00?1", "walker.pedestrian.0001"));
        assert!(wildcard_match("*.model3", "vehicle.tesla.model3"));
        assert!(!wildcard_match("vehicle.*", "walker.pedestrian.0001"));
        assert!(!wildcard_match("vehicle.?", "vehicle.ab"));
        assert!(!wildcard_match("vehicle", "vehicle.tesla"));
    }

    #[test]
    fn test_filter_keeps_order() {
        let list = ActorList::new(vec![
            actor(1, "vehicle.tesla.model3"),
            actor(2, "walker.pedestrian.0001"),
            actor(3, "vehicle.audi.tt"),
            actor(4, "sensor.other.rss"),
        ]);

        let vehicles = list.filter("vehicle.*");
        assert_eq!(vehicles.ids(), vec![1, 3]);
        assert!(vehicles.find(2).is_none());
        assert_eq!(list.len(), 4);
    }
}
