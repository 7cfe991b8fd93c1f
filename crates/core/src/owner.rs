// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Turn identifiers: the unit of a parent agent's conversation step that a
//! spawn is delegated from.

crate::define_id! {
    /// Identifier of a parent agent's turn (loop step) that issued a delegation.
    #[derive(Default)]
    pub struct TurnId;
}

#[cfg(test)]
#[path = "owner_tests.rs"]
mod tests;
