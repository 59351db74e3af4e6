//! Federation mapper reconciliation.
//!
//! Desired mappers are matched to existing ones by id, or by name when no id
//! is given, and merged over them. The result is the complete list of
//! mappers the federation should end up with, from which the create, update
//! and delete calls are planned.

use std::collections::HashSet;

use crate::component::{sort_by_name, Component};
use crate::error::FederationResult;
use crate::resolver::{find_mapper_by_id, find_mapper_by_name};

// ============================================================================
// Matching and Merging
// ============================================================================

/// Finds the existing mapper a desired mapper refers to.
///
/// An id that matches nothing means the mapper is new. A name that matches
/// more than one mapper is an ambiguity error.
pub fn find_base<'a>(
    desired: &Component,
    existing: &'a [Component],
) -> FederationResult<Option<&'a Component>> {
    match (&desired.id, &desired.name) {
        (Some(id), _) => Ok(find_mapper_by_id(existing, id)),
        (None, Some(name)) => find_mapper_by_name(existing, name),
        (None, None) => Ok(None),
    }
}

/// Merges every desired mapper over its existing counterpart.
///
/// The result is sorted by name. Unless `remove_unspecified` is set, existing
/// mappers that no desired mapper refers to are kept unchanged.
pub fn merge_desired(
    desired: &[Component],
    existing: &[Component],
    remove_unspecified: bool,
) -> FederationResult<Vec<Component>> {
    let mut merged = Vec::with_capacity(desired.len());
    for mapper in desired {
        let base = find_base(mapper, existing)?.cloned().unwrap_or_default();
        merged.push(base.merged_with(mapper));
    }
    sort_by_name(&mut merged);

    if !remove_unspecified {
        let listed: HashSet<String> = merged.iter().filter_map(|m| m.id.clone()).collect();
        merged.extend(
            existing
                .iter()
                .filter(|m| m.id.as_ref().map_or(true, |id| !listed.contains(id)))
                .cloned(),
        );
        sort_by_name(&mut merged);
    }

    Ok(merged)
}

// ============================================================================
// Planning
// ============================================================================

/// A single remote call on a mapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapperAction {
    /// Create a new mapper.
    Create(Component),
    /// Replace an existing mapper.
    Update(Component),
    /// Delete the mapper with this id.
    Delete(String),
}

/// Plans the mapper calls for an existing federation.
///
/// Existing mappers missing from `desired` are deleted first. Desired mappers
/// identical to an existing one are skipped; the rest are updated when their
/// id is known and created otherwise, under `federation_id` unless they name
/// a parent.
#[must_use]
pub fn plan_update(
    desired: &[Component],
    existing: &[Component],
    federation_id: &str,
) -> Vec<MapperAction> {
    let desired_ids: HashSet<&str> = desired.iter().filter_map(|m| m.id.as_deref()).collect();

    let mut actions: Vec<MapperAction> = existing
        .iter()
        .filter_map(|m| m.id.as_deref())
        .filter(|id| !desired_ids.contains(id))
        .map(|id| MapperAction::Delete(id.to_string()))
        .collect();

    for mapper in desired {
        if existing.contains(mapper) {
            continue;
        }
        let known = mapper
            .id
            .as_deref()
            .is_some_and(|id| find_mapper_by_id(existing, id).is_some());
        if known {
            actions.push(MapperAction::Update(mapper.clone()));
        } else {
            actions.push(MapperAction::Create(with_parent(mapper, federation_id)));
        }
    }

    actions
}

/// Plans the mapper calls right after a federation was created.
///
/// Keycloak provisions default mappers for some providers on creation. Each
/// desired mapper is matched to a default by name only, since no id of the
/// new federation's mappers can be known beforehand. A matched default is
/// updated with the desired mapper merged over it. When the desired mapper
/// carries its own id, the default is deleted and the merged mapper created
/// under that id instead. Unmatched desired mappers are created. With
/// `remove_unspecified`, defaults no desired mapper matched are deleted
/// afterwards.
pub fn plan_after_create(
    desired: &[Component],
    defaults: &[Component],
    federation_id: &str,
    remove_unspecified: bool,
) -> FederationResult<Vec<MapperAction>> {
    let mut actions = Vec::with_capacity(desired.len());
    let mut touched: HashSet<String> = HashSet::new();

    for mapper in desired {
        let default = match mapper.name.as_deref() {
            Some(name) => find_mapper_by_name(defaults, name)?,
            None => None,
        };
        let Some(default) = default else {
            actions.push(MapperAction::Create(with_parent(mapper, federation_id)));
            continue;
        };

        let merged = default.merged_with(mapper);
        match &default.id {
            Some(id) if merged.id.as_ref() != Some(id) => {
                touched.insert(id.clone());
                actions.push(MapperAction::Delete(id.clone()));
                actions.push(MapperAction::Create(with_parent(&merged, federation_id)));
            }
            Some(id) => {
                touched.insert(id.clone());
                actions.push(MapperAction::Update(merged));
            }
            None => actions.push(MapperAction::Create(with_parent(&merged, federation_id))),
        }
    }

    if remove_unspecified {
        actions.extend(
            defaults
                .iter()
                .filter_map(|m| m.id.as_ref())
                .filter(|id| !touched.contains(*id))
                .map(|id| MapperAction::Delete(id.clone())),
        );
    }

    Ok(actions)
}

fn with_parent(mapper: &Component, federation_id: &str) -> Component {
    let mut mapper = mapper.clone();
    if mapper.parent_id.is_none() {
        mapper.parent_id = Some(federation_id.to_string());
    }
    mapper
}
