// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Causal chain building.
//!
//! Payment events form a forest: every reservation is a root and every other
//! event points at its parent. Reconciliation works on root-to-leaf paths
//! through that forest. A reservation that was charged twice therefore
//! yields two chains sharing the same prefix, and a charge credited twice
//! yields two chains that end in different credits but share the charge.

use crate::LedgerError;
use crate::base::EventId;
use crate::event::PaymentEvent;
use log::trace;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Ordered path of events from a root to a leaf.
pub type PaymentEventChain = Vec<Arc<PaymentEvent>>;

/// Parent to children index over one batch of events.
#[derive(Debug, Default)]
struct RelationshipRegistry {
    children: HashMap<EventId, Vec<Arc<PaymentEvent>>>,
}

impl RelationshipRegistry {
    fn add_child(&mut self, parent: EventId, child: &Arc<PaymentEvent>) {
        self.children
            .entry(parent)
            .or_default()
            .push(Arc::clone(child));
    }

    fn children(&self, parent: EventId) -> Option<&[Arc<PaymentEvent>]> {
        self.children.get(&parent).map(Vec::as_slice)
    }
}

/// Splits `events` into root-to-leaf chains.
///
/// Roots keep their input order and so do siblings, which makes the output
/// deterministic for a given input.
///
/// # Errors
///
/// - [`LedgerError::DuplicateEvent`] - Two events share an ID.
/// - [`LedgerError::OrphanEvent`] - An event's parent is missing, or the
///   event is only reachable through a cycle.
pub fn build_chains(events: &[Arc<PaymentEvent>]) -> Result<Vec<PaymentEventChain>, LedgerError> {
    let mut known = HashSet::with_capacity(events.len());
    for event in events {
        if !known.insert(event.id) {
            return Err(LedgerError::DuplicateEvent(event.id));
        }
    }

    let mut registry = RelationshipRegistry::default();
    let mut roots = Vec::new();
    for event in events {
        match event.parent {
            None => roots.push(Arc::clone(event)),
            Some(parent) if known.contains(&parent) => registry.add_child(parent, event),
            Some(parent) => {
                return Err(LedgerError::OrphanEvent {
                    event: event.id,
                    parent,
                });
            }
        }
    }

    let mut visited: HashSet<EventId> = roots.iter().map(|root| root.id).collect();
    let mut pending: Vec<PaymentEventChain> = roots.into_iter().rev().map(|root| vec![root]).collect();
    let mut chains = Vec::new();

    while let Some(chain) = pending.pop() {
        let Some(last) = chain.last().map(|event| event.id) else {
            continue;
        };
        match registry.children(last) {
            Some(children) => {
                for child in children.iter().rev() {
                    visited.insert(child.id);
                    let mut extended = chain.clone();
                    extended.push(Arc::clone(child));
                    pending.push(extended);
                }
            }
            None => chains.push(chain),
        }
    }

    // Whatever was not reached hangs off a parent cycle.
    if let Some(detached) = events.iter().find(|event| !visited.contains(&event.id)) {
        return Err(LedgerError::OrphanEvent {
            event: detached.id,
            parent: detached.parent.unwrap_or(detached.id),
        });
    }

    trace!("built {} chains from {} events", chains.len(), events.len());
    Ok(chains)
}
