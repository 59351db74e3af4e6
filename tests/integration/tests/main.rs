//! End-to-End Integration Tests
//!
//! These tests drive complete reconciliation runs against an in-memory
//! Keycloak that reproduces the server's component quirks.

mod common;
mod credential_policy;
mod failures;
mod lifecycle;
mod mappers;
