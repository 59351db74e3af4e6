//! Lookup of existing federations and mappers.
//!
//! Keycloak does not enforce unique names among components, so every name
//! lookup here checks that at most one component matches.

use crate::client::ComponentApi;
use crate::component::{sort_by_name, Component, Federation, USER_STORAGE_PROVIDER_TYPE};
use crate::error::{ComponentKind, FederationError, FederationResult};

/// Resolves the existing federation by id, or by name within the realm.
///
/// Returns `Ok(None)` when nothing matches. Mappers are attached sorted by
/// name. The result is not normalized.
pub async fn resolve<A: ComponentApi>(
    api: &A,
    realm: &str,
    id: Option<&str>,
    name: Option<&str>,
) -> FederationResult<Option<Federation>> {
    let component = match (id, name) {
        (Some(id), _) => {
            tracing::debug!(realm, id, "looking up user federation by id");
            api.get(id, realm).await?
        }
        (None, Some(name)) => {
            tracing::debug!(realm, name, "looking up user federation by name");
            let found = api
                .find_by_type_and_name(realm, USER_STORAGE_PROVIDER_TYPE, name)
                .await?;
            select_unique(found, ComponentKind::Federation, name)?
        }
        (None, None) => {
            return Err(FederationError::validation(
                "either `id` or `name` has to be specified",
            ))
        }
    };

    let Some(component) = component else {
        return Ok(None);
    };
    let Some(federation_id) = component.id.clone() else {
        return Ok(Some(Federation::new(component, Vec::new())));
    };

    let mappers = fetch_mappers(api, realm, &federation_id).await?;
    Ok(Some(Federation::new(component, mappers)))
}

/// Fetches the mappers of a federation, sorted by name.
pub async fn fetch_mappers<A: ComponentApi>(
    api: &A,
    realm: &str,
    federation_id: &str,
) -> FederationResult<Vec<Component>> {
    let mut mappers = api.find_children(federation_id, realm).await?;
    sort_by_name(&mut mappers);
    Ok(mappers)
}

/// Reduces a name lookup result to at most one component.
///
/// More than one match is an ambiguity error naming the duplicate.
pub fn select_unique(
    mut found: Vec<Component>,
    kind: ComponentKind,
    name: &str,
) -> FederationResult<Option<Component>> {
    if found.len() > 1 {
        return Err(FederationError::ambiguous(kind, name));
    }
    Ok(found.pop())
}

/// Finds a mapper among `mappers` by name, failing on duplicates.
pub fn find_mapper_by_name<'a>(
    mappers: &'a [Component],
    name: &str,
) -> FederationResult<Option<&'a Component>> {
    let mut found = mappers
        .iter()
        .filter(|mapper| mapper.name.as_deref() == Some(name));
    let first = found.next();
    if found.next().is_some() {
        return Err(FederationError::ambiguous(ComponentKind::Mapper, name));
    }
    Ok(first)
}

/// Finds a mapper among `mappers` by exact id.
#[must_use]
pub fn find_mapper_by_id<'a>(mappers: &'a [Component], id: &str) -> Option<&'a Component> {
    mappers.iter().find(|mapper| mapper.id.as_deref() == Some(id))
}
