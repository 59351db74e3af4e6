//! Reconciliation of one user federation.
//!
//! A run resolves the existing federation, computes the changeset against the
//! caller's [`FederationSpec`] and then takes exactly one of four paths:
//!
//! | existing | target  | path    |
//! |----------|---------|---------|
//! | no       | absent  | no-op   |
//! | no       | present | create  |
//! | yes      | absent  | delete  |
//! | yes      | present | update  |
//!
//! Remote calls are awaited one after another. A remote failure aborts the
//! run where it happened; running again converges from there.

use crate::changeset::{requires_update, Changeset};
use crate::client::ComponentApi;
use crate::component::{Component, Federation};
use crate::config::{BindCredentialUpdateMode, FederationSpec, State};
use crate::error::{ComponentKind, FederationError, FederationResult};
use crate::mapper::{plan_after_create, plan_update, MapperAction};
use crate::normalize::normalize;
use crate::report::{empty_object, sanitize, sanitize_changeset, Diff, ReconcileOutcome};
use crate::resolver::{fetch_mappers, resolve};

/// How a run reports and whether it mutates anything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunMode {
    /// Compute and report, but perform no create, update or delete call.
    pub dry_run: bool,
    /// Include before/after views in the outcome.
    pub diff: bool,
}

impl RunMode {
    /// Mode that mutates and reports without diff.
    #[must_use]
    pub const fn apply() -> Self {
        Self {
            dry_run: false,
            diff: false,
        }
    }

    /// Mode that only reports what would happen.
    #[must_use]
    pub const fn check() -> Self {
        Self {
            dry_run: true,
            diff: false,
        }
    }

    /// Turns diff reporting on.
    #[must_use]
    pub const fn with_diff(mut self) -> Self {
        self.diff = true;
        self
    }
}

/// Drives a single reconciliation run.
///
/// ## Example
///
/// ```no_run
/// use kc_federation::{FederationSpec, InMemoryComponentApi, Reconciler, RunMode};
///
/// # async fn example() -> kc_federation::FederationResult<()> {
/// let api = InMemoryComponentApi::new();
/// let spec = FederationSpec::builder()
///     .name("corp-ldap")
///     .provider_id("ldap")
///     .config("vendor", "ad")
///     .build();
///
/// let outcome = Reconciler::new(&api, spec, RunMode::apply()).run().await?;
/// assert!(outcome.changed);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Reconciler<'a, A> {
    api: &'a A,
    spec: FederationSpec,
    mode: RunMode,
}

impl<'a, A: ComponentApi> Reconciler<'a, A> {
    /// Creates a reconciler for one spec.
    #[must_use]
    pub fn new(api: &'a A, spec: FederationSpec, mode: RunMode) -> Self {
        Self { api, spec, mode }
    }

    /// Runs the reconciliation.
    pub async fn run(self) -> FederationResult<ReconcileOutcome> {
        self.spec.validate()?;

        let before = resolve(
            self.api,
            &self.spec.realm,
            self.spec.id.as_deref(),
            self.spec.name.as_deref(),
        )
        .await?
        .map(normalize);

        let changeset = Changeset::build(&self.spec, before.as_ref())?;
        let desired = changeset.apply(before.as_ref());
        let outcome = ReconcileOutcome::new(
            sanitize_changeset(&changeset)?,
            sanitize(before.as_ref())?,
        );

        match (before, self.spec.state) {
            (None, State::Absent) => Ok(self.nothing_to_delete(outcome)),
            (None, State::Present) => self.create(desired, outcome).await,
            (Some(existing), State::Absent) => self.delete(&existing, outcome).await,
            (Some(existing), State::Present) => self.update(&existing, desired, outcome).await,
        }
    }

    fn nothing_to_delete(&self, mut outcome: ReconcileOutcome) -> ReconcileOutcome {
        tracing::info!(realm = %self.spec.realm, "user federation does not exist; nothing to delete");
        if self.mode.diff {
            outcome.diff = Some(Diff::new(None, None));
        }
        outcome.msg = "User federation does not exist; doing nothing.".to_string();
        outcome
    }

    // ========================================================================
    // Create
    // ========================================================================

    async fn create(
        &self,
        desired: Federation,
        mut outcome: ReconcileOutcome,
    ) -> FederationResult<ReconcileOutcome> {
        let realm = self.spec.realm.as_str();
        outcome.changed = true;

        if self.mode.dry_run {
            let label = label(&desired.component);
            tracing::info!(realm, federation = %label, "user federation would be created");
            let after = sanitize(Some(&desired))?;
            if self.mode.diff {
                outcome.diff = Some(Diff::new(None, Some(after.clone())));
            }
            outcome.end_state = after;
            outcome.msg = format!("User federation {label} would be created");
            return Ok(outcome);
        }

        let Federation {
            component,
            mappers: desired_mappers,
        } = desired;

        tracing::debug!(realm, "creating user federation");
        let created = self.api.create(&component, realm).await?;
        let id = created.id.clone().ok_or_else(|| {
            FederationError::remote("created user federation was returned without an id")
        })?;

        tracing::debug!(realm, federation = %id, "fetching default mappers");
        let defaults = self.api.find_children(&id, realm).await?;
        let actions = plan_after_create(
            &desired_mappers,
            &defaults,
            &id,
            self.spec.remove_unspecified_mappers,
        )?;
        self.execute(&actions).await?;

        let mappers = fetch_mappers(self.api, realm, &id).await?;
        let after = normalize(Federation::new(created, mappers));
        let after = sanitize(Some(&after))?;

        tracing::info!(realm, federation = %id, mapper_calls = actions.len(), "user federation created");
        if self.mode.diff {
            outcome.diff = Some(Diff::new(None, Some(after.clone())));
        }
        outcome.end_state = after;
        outcome.msg = format!("User federation {id} has been created");
        Ok(outcome)
    }

    // ========================================================================
    // Delete
    // ========================================================================

    async fn delete(
        &self,
        existing: &Federation,
        mut outcome: ReconcileOutcome,
    ) -> FederationResult<ReconcileOutcome> {
        let realm = self.spec.realm.as_str();
        let id = existing
            .id()
            .ok_or_else(|| FederationError::remote("existing user federation has no id"))?
            .to_string();
        outcome.changed = true;
        if self.mode.diff {
            outcome.diff = Some(Diff::new(Some(outcome.existing.clone()), None));
        }

        if self.mode.dry_run {
            tracing::info!(realm, federation = %id, "user federation would be deleted");
            outcome.msg = format!("User federation {id} would be deleted");
            return Ok(outcome);
        }

        tracing::debug!(realm, federation = %id, "deleting user federation");
        self.api.delete(&id, realm).await?;

        tracing::info!(realm, federation = %id, "user federation deleted");
        outcome.end_state = empty_object();
        outcome.msg = format!("User federation {id} has been deleted");
        Ok(outcome)
    }

    // ========================================================================
    // Update
    // ========================================================================

    async fn update(
        &self,
        existing: &Federation,
        desired: Federation,
        mut outcome: ReconcileOutcome,
    ) -> FederationResult<ReconcileOutcome> {
        let realm = self.spec.realm.as_str();
        let id = existing
            .id()
            .ok_or_else(|| FederationError::remote("existing user federation has no id"))?
            .to_string();
        let mode = self.spec.bind_credential_update_mode;

        if !requires_update(&desired, existing, mode) {
            tracing::info!(realm, federation = %id, "user federation is up to date");
            outcome.end_state = sanitize(Some(&desired))?;
            outcome.msg = format!("No changes required to user federation {id}.");
            return Ok(outcome);
        }

        if mode == BindCredentialUpdateMode::Always
            && !requires_update(&desired, existing, BindCredentialUpdateMode::OnlyIndirect)
        {
            tracing::warn!(
                realm,
                federation = %id,
                "only the bind credential is set; it is sent again on every run"
            );
        }

        outcome.changed = true;
        if self.mode.dry_run {
            tracing::info!(realm, federation = %id, "user federation would be updated");
            let after = sanitize(Some(&desired))?;
            if self.mode.diff {
                outcome.diff = Some(Diff::new(Some(outcome.existing.clone()), Some(after.clone())));
            }
            outcome.end_state = after;
            outcome.msg = format!("User federation {id} would be updated");
            return Ok(outcome);
        }

        let Federation {
            component,
            mappers: desired_mappers,
        } = desired;

        tracing::debug!(realm, federation = %id, "updating user federation");
        self.api.update(&component, realm).await?;

        let actions = plan_update(&desired_mappers, &existing.mappers, &id);
        self.execute(&actions).await?;

        let refreshed = self
            .api
            .get(&id, realm)
            .await?
            .ok_or_else(|| FederationError::not_found(ComponentKind::Federation, &id))?;
        let mappers = fetch_mappers(self.api, realm, &id).await?;
        let after = sanitize(Some(&normalize(Federation::new(refreshed, mappers))))?;

        outcome.changed = outcome.existing != after;
        tracing::info!(
            realm,
            federation = %id,
            changed = outcome.changed,
            mapper_calls = actions.len(),
            "user federation updated"
        );
        if self.mode.diff {
            outcome.diff = Some(Diff::new(Some(outcome.existing.clone()), Some(after.clone())));
        }
        outcome.end_state = after;
        outcome.msg = format!("User federation {id} has been updated");
        Ok(outcome)
    }

    // ========================================================================
    // Mapper Calls
    // ========================================================================

    async fn execute(&self, actions: &[MapperAction]) -> FederationResult<()> {
        let realm = self.spec.realm.as_str();
        for action in actions {
            match action {
                MapperAction::Create(mapper) => {
                    tracing::debug!(realm, mapper = mapper.name_or_empty(), "creating mapper");
                    self.api.create(mapper, realm).await?;
                }
                MapperAction::Update(mapper) => {
                    tracing::debug!(realm, mapper = mapper.name_or_empty(), "updating mapper");
                    self.api.update(mapper, realm).await?;
                }
                MapperAction::Delete(id) => {
                    tracing::debug!(realm, mapper = %id, "deleting mapper");
                    self.api.delete(id, realm).await?;
                }
            }
        }
        Ok(())
    }
}

/// Names a federation that may not have an id yet.
fn label(component: &Component) -> &str {
    component
        .id
        .as_deref()
        .unwrap_or_else(|| component.name_or_empty())
}
