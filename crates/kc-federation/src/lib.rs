//! # kc-federation
//!
//! User federation reconciliation for Keycloak.
//!
//! This crate converges a user federation (an LDAP, Kerberos or SSSD
//! connector) and its attribute mappers to a declared state through the
//! Keycloak component endpoints, making only the changes that are needed.
//!
//! ## Modules
//!
//! - [`component`] - Wire model of components and the federation field table
//! - [`codec`] - Typed config values and their wire encoding
//! - [`normalize`] - Rules undoing the server's echo asymmetries
//! - [`resolver`] - Unambiguous lookup of federations and mappers
//! - [`changeset`] - Field differences and the bind credential policy
//! - [`mapper`] - Mapper matching, merging and call planning
//! - [`reconcile`] - The create/update/delete state machine
//! - [`report`] - Sanitized outcome and diff rendering
//! - [`client`] - The admin API abstraction the reconciler talks to
//! - [`memory`] - In-memory admin API for tests and local runs
//! - [`config`] - Desired state as supplied by the caller
//! - [`error`] - Error types
//!
//! ## Quick Start
//!
//! ```ignore
//! use kc_federation::{FederationSpec, MapperSpec, Reconciler, RunMode};
//!
//! let spec = FederationSpec::builder()
//!     .realm("acme")
//!     .name("corp-ldap")
//!     .provider_id("ldap")
//!     .config("connectionUrl", "ldaps://ldap.acme.internal")
//!     .config("bindCredential", "secret")
//!     .mapper(MapperSpec::named("email").config("ldap.attribute", "mail"))
//!     .build();
//!
//! let outcome = Reconciler::new(&api, spec, RunMode::apply()).run().await?;
//! println!("{}", outcome.msg);
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod changeset;
pub mod client;
pub mod codec;
pub mod component;
pub mod config;
pub mod error;
pub mod mapper;
pub mod memory;
pub mod normalize;
pub mod reconcile;
pub mod report;
pub mod resolver;

pub use changeset::{Changeset, FieldValue};
pub use client::ComponentApi;
pub use codec::{ConfigValue, TypedConfig};
pub use component::{Component, Federation, FederationField, WireConfig};
pub use config::{BindCredentialUpdateMode, FederationSpec, MapperSpec, State};
pub use error::{ComponentKind, FederationError, FederationResult};
pub use memory::InMemoryComponentApi;
pub use normalize::normalize;
pub use reconcile::{Reconciler, RunMode};
pub use report::{sanitize, Diff, ReconcileOutcome};
pub use resolver::resolve;
