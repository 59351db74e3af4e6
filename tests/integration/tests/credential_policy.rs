//! Bind credential change detection.

use kc_federation::changeset::BIND_CREDENTIAL;
use kc_federation::memory::MutationKind;
use kc_federation::report::SECRET_MASK;
use kc_federation::BindCredentialUpdateMode;

use crate::common::{corp, TestEnv};

async fn federation_id(env: &TestEnv) -> anyhow::Result<String> {
    env.current("corp")
        .await?
        .and_then(|f| f.id().map(str::to_string))
        .ok_or_else(|| anyhow::anyhow!("corp does not exist"))
}

#[tokio::test]
async fn test_only_indirect_ignores_a_lone_secret_change() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let mode = BindCredentialUpdateMode::OnlyIndirect;
    env.apply(corp().bind_credential_update_mode(mode).config(BIND_CREDENTIAL, "first").build())
        .await?;
    let id = federation_id(&env).await?;
    let mutations = env.mutations().await;

    let outcome = env
        .apply(corp().bind_credential_update_mode(mode).config(BIND_CREDENTIAL, "second").build())
        .await?;

    assert!(!outcome.changed);
    assert_eq!(env.mutations().await, mutations);
    assert_eq!(
        env.api.raw_config_value(&id, BIND_CREDENTIAL).await.as_deref(),
        Some("first")
    );
    Ok(())
}

#[tokio::test]
async fn test_only_indirect_sends_secret_with_other_changes() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let mode = BindCredentialUpdateMode::OnlyIndirect;
    env.apply(corp().bind_credential_update_mode(mode).config(BIND_CREDENTIAL, "first").build())
        .await?;
    let id = federation_id(&env).await?;

    let outcome = env
        .apply(
            corp()
                .bind_credential_update_mode(mode)
                .config(BIND_CREDENTIAL, "second")
                .config("vendor", "other")
                .build(),
        )
        .await?;

    assert!(outcome.changed);
    assert_eq!(outcome.end_state["config"][BIND_CREDENTIAL], SECRET_MASK);
    assert_eq!(
        env.api.raw_config_value(&id, BIND_CREDENTIAL).await.as_deref(),
        Some("second")
    );
    Ok(())
}

#[tokio::test]
async fn test_always_resends_secret() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let spec = corp().config(BIND_CREDENTIAL, "first").build();
    env.apply(spec.clone()).await?;
    let id = federation_id(&env).await?;
    env.api.clear_journal().await;

    let outcome = env.apply(spec).await?;

    let journal = env.api.journal().await;
    assert_eq!(journal.len(), 1);
    assert_eq!(journal[0].kind, MutationKind::Update);
    assert_eq!(journal[0].id, id);
    assert!(outcome.msg.ends_with("has been updated"));
    assert!(!outcome.changed, "the masked secret reads back the same");
    Ok(())
}

#[tokio::test]
async fn test_unspecified_secret_is_kept() -> anyhow::Result<()> {
    let env = TestEnv::new();
    env.apply(corp().config(BIND_CREDENTIAL, "first").build()).await?;
    let id = federation_id(&env).await?;

    let outcome = env.apply(corp().config("vendor", "other").build()).await?;

    assert!(outcome.changed);
    assert_eq!(
        env.api.raw_config_value(&id, BIND_CREDENTIAL).await.as_deref(),
        Some("first")
    );
    Ok(())
}
