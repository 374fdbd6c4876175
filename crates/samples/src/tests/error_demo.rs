use a2ui::{
    Config,
    component,
    error::Result,
    message::Message,
    testing::frames::{take, updates},
};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::{engine, error_demo::SURFACE_ID};

#[tokio::test]
async fn reports_are_counted_per_surface() -> Result<()> {
    let engine = engine(Config::default());
    let mut down = engine.open(SURFACE_ID)?;
    let handshake = take(&mut down, 3).await;
    assert_eq!(
        updates(&handshake)[0].1,
        json!({"lastErrorMessage": "No errors reported yet.", "errorCount": 0})
    );

    engine
        .post(
            SURFACE_ID,
            r#"{"error":{"code":"VALIDATION_FAILED","message":"Email is invalid","path":"/form/email"}}"#,
        )
        .collect()
        .await;
    let frames = engine
        .post(
            SURFACE_ID,
            r#"{"error":{"code":"TIMEOUT","message":"Request took too long"}}"#,
        )
        .collect()
        .await;
    assert_eq!(
        updates(&frames),
        vec![(
            "/".to_string(),
            json!({
                "lastErrorMessage": "Server received error #2: [TIMEOUT] Request took too long",
                "errorCount": 2,
            })
        )]
    );
    Ok(())
}

#[tokio::test]
async fn path_clause_when_present() -> Result<()> {
    let engine = engine(Config::default());
    let _down = engine.open(SURFACE_ID)?;
    let frames = engine
        .post(
            SURFACE_ID,
            r#"{"error":{"code":"VALIDATION_FAILED","message":"bad","path":"/form/email"}}"#,
        )
        .collect()
        .await;
    assert_eq!(
        updates(&frames)[0].1["lastErrorMessage"],
        json!("Server received error #1: [VALIDATION_FAILED] bad (path: /form/email)")
    );
    Ok(())
}

#[tokio::test]
async fn unknown_component_is_sent_unchanged() -> Result<()> {
    let engine = engine(Config::default());
    let mut down = engine.open(SURFACE_ID)?;
    let handshake = take(&mut down, 3).await;
    let Some(Message::UpdateComponents { components, .. }) = handshake[2].message() else {
        panic!("expected the tree");
    };
    let fancy = components
        .iter()
        .find(|c| c.id == "unknown-component")
        .unwrap();
    assert_eq!(fancy.component, "FancyWidget");
    assert!(!component::is_standard(&fancy.component));
    Ok(())
}
