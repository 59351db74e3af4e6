//! Create, update, delete and no-op paths.

use kc_federation::memory::MASTER_REALM;
use kc_federation::{MapperSpec, RunMode, State};
use serde_json::json;

use crate::common::{corp, department, TestEnv};

#[tokio::test]
async fn test_create_then_rerun_is_noop() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let spec = corp()
        .mapper(MapperSpec::named("email").config("ldap.attribute", "mail"))
        .mapper(department())
        .build();

    let created = env.apply(spec.clone()).await?;
    assert!(created.changed);
    assert!(created.msg.ends_with("has been created"));
    assert_eq!(created.existing, json!({}));

    let before = env.mutations().await;
    let second = env.apply(spec).await?;

    assert!(!second.changed);
    assert!(second.msg.starts_with("No changes required to user federation "));
    assert_eq!(second.end_state, second.existing);
    assert_eq!(env.mutations().await, before);
    Ok(())
}

#[tokio::test]
async fn test_create_end_state_lists_reconciled_mappers() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let spec = corp()
        .mapper(MapperSpec::named("username").config("ldap.attribute", "sAMAccountName"))
        .mapper(department())
        .build();

    let outcome = env.apply(spec).await?;

    let names: Vec<_> = outcome.end_state["mappers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["name"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(names, vec!["department", "username"]);
    assert_eq!(env.mapper_names("corp").await?, names);

    let end = &outcome.end_state;
    assert_eq!(end["config"]["vendor"], "ad");
    assert_eq!(end["config"]["krbPrincipalAttribute"], "");
    assert!(end["config"].get("lastSync").is_none());
    Ok(())
}

#[tokio::test]
async fn test_create_without_mappers_removes_defaults() -> anyhow::Result<()> {
    let env = TestEnv::new();
    env.apply(corp().build()).await?;
    assert!(env.mapper_names("corp").await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_create_can_keep_defaults() -> anyhow::Result<()> {
    let env = TestEnv::new();
    env.apply(corp().remove_unspecified_mappers(false).build())
        .await?;

    assert_eq!(
        env.mapper_names("corp").await?,
        vec!["email", "first name", "last name", "username"]
    );
    Ok(())
}

#[tokio::test]
async fn test_update_by_id() -> anyhow::Result<()> {
    let env = TestEnv::new();
    env.apply(corp().build()).await?;
    let id = env
        .current("corp")
        .await?
        .and_then(|f| f.id().map(str::to_string))
        .unwrap();

    let spec = kc_federation::FederationSpec::builder()
        .id(&id)
        .config("vendor", "rhds")
        .build();
    let outcome = env.apply(spec).await?;

    assert!(outcome.changed);
    assert_eq!(outcome.msg, format!("User federation {id} has been updated"));
    assert_eq!(outcome.end_state["name"], "corp");
    assert_eq!(outcome.end_state["config"]["vendor"], "rhds");
    assert_eq!(outcome.end_state["config"]["usersDn"], "ou=people,dc=example,dc=com");
    Ok(())
}

#[tokio::test]
async fn test_update_without_mappers_leaves_them_alone() -> anyhow::Result<()> {
    let env = TestEnv::new();
    env.apply(corp().mapper(MapperSpec::named("email")).mapper(department()).build())
        .await?;

    let outcome = env.apply(corp().config("vendor", "other").build()).await?;

    assert!(outcome.changed);
    assert_eq!(env.mapper_names("corp").await?, vec!["department", "email"]);
    Ok(())
}

#[tokio::test]
async fn test_delete_and_delete_again() -> anyhow::Result<()> {
    let env = TestEnv::new();
    env.apply(corp().mapper(department()).build()).await?;

    let deleted = env.apply(corp().state(State::Absent).build()).await?;
    assert!(deleted.changed);
    assert!(deleted.msg.ends_with("has been deleted"));
    assert_eq!(deleted.end_state, json!({}));
    assert_eq!(env.api.len(MASTER_REALM).await, 0);

    let again = env.apply(corp().state(State::Absent).build()).await?;
    assert!(!again.changed);
    assert_eq!(again.msg, "User federation does not exist; doing nothing.");
    Ok(())
}

#[tokio::test]
async fn test_dry_run_create_and_delete() -> anyhow::Result<()> {
    let env = TestEnv::new();

    let planned = env
        .run(corp().build(), RunMode::check().with_diff())
        .await?;
    assert!(planned.changed);
    assert!(planned.msg.ends_with("would be created"));
    let diff = planned.diff.unwrap();
    assert_eq!(diff.before, json!(""));
    assert_eq!(diff.after["config"]["vendor"], "ad");
    assert_eq!(env.mutations().await, 0);

    env.apply(corp().build()).await?;
    let mutations = env.mutations().await;

    let planned = env
        .run(corp().state(State::Absent).build(), RunMode::check().with_diff())
        .await?;
    assert!(planned.changed);
    let diff = planned.diff.unwrap();
    assert_eq!(diff.before["name"], "corp");
    assert_eq!(diff.after, json!(""));
    assert_eq!(env.mutations().await, mutations);
    assert!(env.current("corp").await?.is_some());
    Ok(())
}

#[tokio::test]
async fn test_ignored_key_is_not_a_change() -> anyhow::Result<()> {
    let env = TestEnv::new();
    env.apply(corp().build()).await?;
    env.api.ignore_config_key("allowKerberosAuthentication").await;

    let spec = corp().config("allowKerberosAuthentication", true).build();

    let planned = env.run(spec.clone(), RunMode::check()).await?;
    assert!(planned.changed, "a dry run cannot see what the server ignores");

    let outcome = env.apply(spec).await?;
    assert!(!outcome.changed);
    assert_eq!(outcome.proposed["config"]["allowKerberosAuthentication"], "true");
    assert_eq!(outcome.end_state, outcome.existing);
    Ok(())
}
