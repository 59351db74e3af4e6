//! Fatal conditions and recovery from partial runs.

use kc_federation::component::USER_STORAGE_PROVIDER_TYPE;
use kc_federation::memory::{MutationKind, MASTER_REALM};
use kc_federation::{Component, FederationError, FederationSpec, MapperSpec, Reconciler, RunMode};

use crate::common::{corp, department, TestEnv};

async fn run_err(env: &TestEnv, spec: FederationSpec) -> FederationError {
    match Reconciler::new(&env.api, spec, RunMode::apply()).run().await {
        Ok(outcome) => panic!("expected an error, got {outcome:?}"),
        Err(err) => err,
    }
}

#[tokio::test]
async fn test_duplicate_federation_names_are_ambiguous() -> anyhow::Result<()> {
    let env = TestEnv::new();
    for _ in 0..2 {
        env.api
            .seed(
                MASTER_REALM,
                Component::named("dup")
                    .with_provider_id("ldap")
                    .with_provider_type(USER_STORAGE_PROVIDER_TYPE),
            )
            .await;
    }

    let err = run_err(&env, FederationSpec::builder().name("dup").build()).await;

    assert!(err.is_ambiguity());
    assert!(err.to_string().contains("`dup`"));
    assert_eq!(env.mutations().await, 0);
    Ok(())
}

#[tokio::test]
async fn test_kerberos_with_mappers_is_rejected_up_front() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let spec = FederationSpec::builder()
        .name("krb")
        .provider_id("kerberos")
        .config("kerberosRealm", "EXAMPLE.COM")
        .mapper(MapperSpec::named("email"))
        .build();

    let err = run_err(&env, spec).await;

    assert!(err.is_validation());
    assert_eq!(err.to_string(), "validation error: cannot configure mappers for kerberos provider");
    assert_eq!(env.mutations().await, 0);
    Ok(())
}

#[tokio::test]
async fn test_anonymous_mapper_is_rejected() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let err = run_err(&env, corp().mapper(MapperSpec::default()).build()).await;

    assert!(err.is_validation());
    assert_eq!(env.mutations().await, 0);
    Ok(())
}

#[tokio::test]
async fn test_missing_identity_is_rejected() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let err = run_err(&env, FederationSpec::default()).await;
    assert!(err.is_validation());
    Ok(())
}

#[tokio::test]
async fn test_duplicate_default_mappers_are_ambiguous_on_create() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let email = || {
        Component::named("email")
            .with_provider_id("user-attribute-ldap-mapper")
            .with_config("ldap.attribute", "mail")
    };
    env.api.set_default_mappers("ldap", vec![email(), email()]).await;

    let err = run_err(&env, corp().mapper(MapperSpec::named("email")).build()).await;

    assert!(err.is_ambiguity());
    assert!(err.to_string().contains("`email`"));
    Ok(())
}

#[tokio::test]
async fn test_partial_update_converges_on_rerun() -> anyhow::Result<()> {
    let env = TestEnv::new();
    env.apply(corp().build()).await?;

    let spec = corp().config("vendor", "other").mapper(department()).build();
    env.api.fail_next(MutationKind::Create).await;

    let err = run_err(&env, spec.clone()).await;
    assert!(err.is_remote());
    let partial = env.current("corp").await?.unwrap();
    assert_eq!(partial.component.config_value("vendor"), Some("other"));
    assert!(partial.mappers.is_empty());

    let resumed = env.apply(spec.clone()).await?;
    assert!(resumed.changed);
    assert_eq!(env.mapper_names("corp").await?, vec!["department"]);

    let settled = env.apply(spec).await?;
    assert!(!settled.changed);
    Ok(())
}

#[tokio::test]
async fn test_remote_error_message_is_kept() -> anyhow::Result<()> {
    let env = TestEnv::new();
    env.api.fail_next(MutationKind::Create).await;

    let err = run_err(&env, corp().build()).await;

    assert!(err.is_remote());
    assert!(err.to_string().contains("injected Create failure"));
    Ok(())
}
