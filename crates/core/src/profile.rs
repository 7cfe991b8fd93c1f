// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Profile: a named role description (spec.md §3).

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A named role description. Immutable over a session's lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    /// Name of the backing agent type (resolved against the binding
    /// registry at `StartSpawn` time; see `ChildAgentBinding`).
    pub agent_type: String,
    /// Maximum concurrent instances of this profile, if capped.
    pub max_instances: Option<u32>,
    /// Configured per-spawn timeout for this profile, if any.
    #[serde(with = "duration_ms_opt", default)]
    pub timeout: Option<Duration>,
}

impl Profile {
    pub fn new(name: impl Into<String>, agent_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            agent_type: agent_type.into(),
            max_instances: None,
            timeout: None,
        }
    }

    pub fn with_max_instances(mut self, max: u32) -> Self {
        self.max_instances = Some(max);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

mod duration_ms_opt {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(v: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        v.map(|d| d.as_millis() as u64).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        let millis: Option<u64> = Option::deserialize(d)?;
        Ok(millis.map(Duration::from_millis))
    }
}

/// In-memory registry of immutable profiles, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct ProfileSet {
    profiles: std::collections::HashMap<String, Profile>,
}

impl ProfileSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, profile: Profile) {
        self.profiles.insert(profile.name.clone(), profile);
    }

    pub fn get(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.profiles.contains_key(name)
    }
}

#[cfg(test)]
#[path = "profile_tests.rs"]
mod tests;
