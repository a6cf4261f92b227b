//! DynamicsStore - ego / other dynamics profiles
//!
//! Profiles are replaced whole under a short write lock, so a check always
//! sees a consistent profile. Changes are visible to the next check.

use std::sync::{PoisonError, RwLock};

use contracts::{DynamicsConfig, DynamicsProfile, DynamicsRole};

/// Shared dynamics profiles for one sensor
#[derive(Debug)]
pub struct DynamicsStore {
    ego: RwLock<DynamicsProfile>,
    other: RwLock<DynamicsProfile>,
}

impl DynamicsStore {
    pub fn new(ego: DynamicsProfile, other: DynamicsProfile) -> Self {
        Self {
            ego: RwLock::new(ego),
            other: RwLock::new(other),
        }
    }

    pub fn from_config(config: &DynamicsConfig) -> Self {
        Self::new(config.ego, config.other)
    }

    fn slot(&self, role: DynamicsRole) -> &RwLock<DynamicsProfile> {
        match role {
            DynamicsRole::Ego => &self.ego,
            DynamicsRole::Other => &self.other,
        }
    }

    /// Current profile for a role
    pub fn get(&self, role: DynamicsRole) -> DynamicsProfile {
        *self
            .slot(role)
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the profile for a role
    pub fn set(&self, role: DynamicsRole, profile: DynamicsProfile) {
        *self
            .slot(role)
            .write()
            .unwrap_or_else(PoisonError::into_inner) = profile;
    }

    /// Both profiles, (ego, other)
    pub fn snapshot(&self) -> (DynamicsProfile, DynamicsProfile) {
        (self.get(DynamicsRole::Ego), self.get(DynamicsRole::Other))
    }
}

impl Default for DynamicsStore {
    fn default() -> Self {
        Self::new(DynamicsProfile::default_ego(), DynamicsProfile::default_other())
    }
}
