//! Mapper matching, merging and retention.

use kc_federation::memory::MASTER_REALM;
use kc_federation::{Component, MapperSpec};

use crate::common::{corp, department, TestEnv};

async fn mapper_id(env: &TestEnv, name: &str) -> anyhow::Result<String> {
    let federation = env
        .current("corp")
        .await?
        .ok_or_else(|| anyhow::anyhow!("corp does not exist"))?;
    federation
        .mappers
        .iter()
        .find(|m| m.name.as_deref() == Some(name))
        .and_then(|m| m.id.clone())
        .ok_or_else(|| anyhow::anyhow!("mapper {name} does not exist"))
}

#[tokio::test]
async fn test_merge_by_id_preserves_untouched_config() -> anyhow::Result<()> {
    let env = TestEnv::new();
    env.apply(
        corp()
            .mapper(MapperSpec::named("email").config("a", "1").config("b", "2"))
            .build(),
    )
    .await?;
    let id = mapper_id(&env, "email").await?;

    let outcome = env
        .apply(corp().mapper(MapperSpec::with_id(&id).config("a", "9")).build())
        .await?;

    assert!(outcome.changed);
    let mapper = &outcome.end_state["mappers"][0];
    assert_eq!(mapper["id"], id.as_str());
    assert_eq!(mapper["name"], "email");
    assert_eq!(mapper["config"]["a"], "9");
    assert_eq!(mapper["config"]["b"], "2");
    assert_eq!(mapper["config"]["ldap.attribute"], "mail");
    Ok(())
}

#[tokio::test]
async fn test_unspecified_mapper_survives_when_retained() -> anyhow::Result<()> {
    let env = TestEnv::new();
    env.apply(corp().mapper(MapperSpec::named("email")).mapper(department()).build())
        .await?;
    let department_before = env
        .current("corp")
        .await?
        .and_then(|f| f.mappers.into_iter().find(|m| m.name.as_deref() == Some("department")));

    let spec = corp()
        .remove_unspecified_mappers(false)
        .mapper(MapperSpec::named("email").config("read.only", false))
        .build();
    let outcome = env.apply(spec).await?;

    assert!(outcome.changed);
    let department_after = env
        .current("corp")
        .await?
        .and_then(|f| f.mappers.into_iter().find(|m| m.name.as_deref() == Some("department")));
    assert_eq!(department_after, department_before);
    Ok(())
}

#[tokio::test]
async fn test_unspecified_mapper_is_deleted_by_default() -> anyhow::Result<()> {
    let env = TestEnv::new();
    env.apply(corp().mapper(MapperSpec::named("email")).mapper(department()).build())
        .await?;

    let outcome = env.apply(corp().mapper(MapperSpec::named("email")).build()).await?;

    assert!(outcome.changed);
    assert_eq!(env.mapper_names("corp").await?, vec!["email"]);
    Ok(())
}

#[tokio::test]
async fn test_new_mapper_is_parented_to_federation() -> anyhow::Result<()> {
    let env = TestEnv::new();
    env.apply(corp().mapper(MapperSpec::named("email")).build()).await?;

    env.apply(corp().mapper(MapperSpec::named("email")).mapper(department()).build())
        .await?;

    let federation = env.current("corp").await?.unwrap();
    let created = federation
        .mappers
        .iter()
        .find(|m| m.name.as_deref() == Some("department"))
        .unwrap();
    assert_eq!(created.parent_id.as_deref(), federation.id());
    Ok(())
}

#[tokio::test]
async fn test_empty_mapper_list_removes_all() -> anyhow::Result<()> {
    let env = TestEnv::new();
    env.apply(corp().mapper(MapperSpec::named("email")).mapper(department()).build())
        .await?;

    env.apply(corp().mappers(Vec::new()).build()).await?;

    assert!(env.mapper_names("corp").await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_duplicate_mapper_names_are_ambiguous() -> anyhow::Result<()> {
    let env = TestEnv::new();
    env.apply(corp().mapper(MapperSpec::named("email")).build()).await?;
    let federation_id = env.current("corp").await?.and_then(|f| f.id().map(str::to_string)).unwrap();
    env.api
        .seed(MASTER_REALM, Component::named("email").with_parent_id(&federation_id))
        .await;
    let before = env.mutations().await;

    let err = env
        .apply(corp().mapper(MapperSpec::named("email")).build())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("found multiple mappers with name `email`"));
    assert_eq!(env.mutations().await, before);
    Ok(())
}

#[tokio::test]
async fn test_mapper_with_own_id_replaces_same_named_default() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let email = MapperSpec {
        id: Some("my-email".to_string()),
        ..MapperSpec::named("email").config("ldap.attribute", "userPrincipalName")
    };
    let spec = corp().remove_unspecified_mappers(false).mapper(email).build();

    let created = env.apply(spec.clone()).await?;

    assert!(created.changed);
    assert_eq!(
        env.mapper_names("corp").await?,
        vec!["email", "first name", "last name", "username"]
    );
    assert_eq!(mapper_id(&env, "email").await?, "my-email");
    let mapper = &created.end_state["mappers"][0];
    assert_eq!(mapper["config"]["ldap.attribute"], "userPrincipalName");
    assert_eq!(mapper["config"]["user.model.attribute"], "email");

    let rerun = env.apply(spec).await?;
    assert!(!rerun.changed);
    assert!(rerun.msg.starts_with("No changes required"));
    Ok(())
}
