use a2ui::{
    Config, SurfaceOptions,
    component::is_standard,
    error::Result,
    message::Message,
    testing::frames::{drain, kinds, take},
};
use pretty_assertions::assert_eq;

use crate::{engine, gallery::SURFACE_ID};

#[tokio::test]
async fn presentation_only() -> Result<()> {
    let engine = engine(Config::default());
    let mut down = engine.open(SURFACE_ID)?;
    let handshake = take(&mut down, 2).await;
    assert_eq!(kinds(&handshake), ["createSurface", "updateComponents"]);
    assert!(drain(&mut down).is_empty());
    assert_eq!(down.surface().with(|s| s.options().clone()), SurfaceOptions::default());

    let Some(Message::UpdateComponents { components, .. }) = handshake[1].message() else {
        panic!("expected the tree");
    };
    assert!(components.iter().all(|c| is_standard(&c.component)));
    Ok(())
}

#[test]
fn every_sample_is_registered() {
    let ids = engine(Config::default()).surface_ids();
    assert_eq!(
        ids,
        [
            "contacts",
            "error-demo",
            "gallery",
            "restaurant-finder",
            "state-machine",
        ]
    );
}
