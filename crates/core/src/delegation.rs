// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Delegation Rule: the set of delegations a parent profile may perform
//! (spec.md §3).

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default effective parallelism when a delegation rule does not override it
/// (spec.md §4.4.1, Admission).
pub const DEFAULT_MAX_PARALLEL: u32 = 4;

/// Default unit for per-entry timeouts (spec.md §4.4.2 step 8).
pub const DEFAULT_TIMEOUT_UNIT: Duration = Duration::from_secs(60);

/// One entry in a delegation rule: binds a child profile (optionally
/// disambiguated by role) to spawn-time policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelegationEntry {
    pub child_profile: String,
    /// Disambiguates between multiple entries for the same child profile.
    pub role: Option<String>,
    pub speed_hint: Option<String>,
    pub handoff: bool,
    /// Overrides the child profile's intrinsic instance cap when > 0.
    pub instance_cap: Option<u32>,
    /// Timeout in `DEFAULT_TIMEOUT_UNIT` units (minutes, by default).
    pub timeout_minutes: Option<u32>,
}

impl DelegationEntry {
    pub fn new(child_profile: impl Into<String>) -> Self {
        Self {
            child_profile: child_profile.into(),
            role: None,
            speed_hint: None,
            handoff: false,
            instance_cap: None,
            timeout_minutes: None,
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_instance_cap(mut self, cap: u32) -> Self {
        self.instance_cap = Some(cap);
        self
    }

    pub fn with_timeout_minutes(mut self, minutes: u32) -> Self {
        self.timeout_minutes = Some(minutes);
        self
    }

    pub fn with_handoff(mut self, handoff: bool) -> Self {
        self.handoff = handoff;
        self
    }

    pub fn timeout(&self, unit: Duration) -> Option<Duration> {
        self.timeout_minutes.map(|m| unit * m)
    }
}

/// The set of delegations a parent profile may perform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelegationRule {
    /// Maximum parallel children for the parent profile that owns this rule.
    pub max_parallel: Option<u32>,
    pub entries: Vec<DelegationEntry>,
}

impl DelegationRule {
    pub fn new(entries: Vec<DelegationEntry>) -> Self {
        Self {
            max_parallel: None,
            entries,
        }
    }

    pub fn with_max_parallel(mut self, max: u32) -> Self {
        self.max_parallel = Some(max);
        self
    }

    /// Effective parallelism: the configured cap, or [`DEFAULT_MAX_PARALLEL`].
    pub fn effective_max_parallel(&self) -> u32 {
        self.max_parallel.unwrap_or(DEFAULT_MAX_PARALLEL)
    }

    /// Find all entries matching a child profile name.
    pub fn entries_for(&self, child_profile: &str) -> Vec<&DelegationEntry> {
        self.entries
            .iter()
            .filter(|e| e.child_profile == child_profile)
            .collect()
    }

    /// Resolve the single delegation entry to use for a request.
    ///
    /// Spec.md §4.4.1 precondition 4: if multiple entries match by child
    /// profile name, the request must name a role to disambiguate.
    pub fn resolve<'a>(
        &'a self,
        child_profile: &str,
        requested_role: Option<&str>,
    ) -> Result<&'a DelegationEntry, ResolveError> {
        let matches = self.entries_for(child_profile);
        match matches.len() {
            0 => Err(ResolveError::NotDelegated),
            1 => Ok(matches[0]),
            _ => {
                let Some(role) = requested_role else {
                    return Err(ResolveError::MultipleRoles);
                };
                matches
                    .into_iter()
                    .find(|e| e.role.as_deref() == Some(role))
                    .ok_or(ResolveError::MultipleRoles)
            }
        }
    }
}

/// Errors resolving a single delegation entry for a spawn request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("child profile is not listed in the delegation rule")]
    NotDelegated,
    #[error("multiple roles are configured for this child profile; a role must be specified")]
    MultipleRoles,
}

#[cfg(test)]
#[path = "delegation_tests.rs"]
mod tests;
