//! Admin API client abstraction.
//!
//! The reconciler never talks HTTP itself. It goes through [`ComponentApi`],
//! which covers the component endpoints of a realm. Token handling, retries
//! and timeouts belong to the implementation.

use crate::component::Component;
use crate::error::FederationResult;

/// Access to the components of a realm.
///
/// ## Implementation Notes
///
/// - `get` returns `Ok(None)` for an unknown id instead of an error
/// - `create` returns the stored component including its assigned id
/// - deleting a component also deletes its children
#[allow(async_fn_in_trait)]
pub trait ComponentApi {
    /// Finds components of the given type with the given name.
    async fn find_by_type_and_name(
        &self,
        realm: &str,
        provider_type: &str,
        name: &str,
    ) -> FederationResult<Vec<Component>>;

    /// Gets a component by id.
    async fn get(&self, id: &str, realm: &str) -> FederationResult<Option<Component>>;

    /// Creates a component and returns it with its assigned id.
    async fn create(&self, component: &Component, realm: &str) -> FederationResult<Component>;

    /// Replaces a component. The component must carry its id.
    async fn update(&self, component: &Component, realm: &str) -> FederationResult<()>;

    /// Deletes a component and its children.
    async fn delete(&self, id: &str, realm: &str) -> FederationResult<()>;

    /// Lists the direct children of a component.
    async fn find_children(&self, parent_id: &str, realm: &str)
        -> FederationResult<Vec<Component>>;
}
