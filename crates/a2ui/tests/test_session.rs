//! Tests for downstream sessions: handshake, keepalive, drivers, shutdown.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use a2ui::{
        Agent, Component, Config, Downstream, Engine, SurfaceOptions,
        config::SessionMode,
        driver::{Driver, PipelineDriver, Stage},
        error::Result,
        message::{Frame, Message},
    };
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};
    use tokio::time;

    struct Board {
        send_model: bool,
        stages: usize,
    }

    impl Agent for Board {
        fn surface_id(&self) -> &str {
            "board"
        }

        fn options(&self) -> SurfaceOptions {
            SurfaceOptions::default().send_data_model(self.send_model)
        }

        fn initial_model(&self) -> Value {
            json!({"pipeline": {}})
        }

        fn components(&self) -> Vec<Component> {
            vec![Component::new("root", "StateMachine").set("data", "/pipeline")]
        }

        fn driver(&self, config: &Config) -> Option<Box<dyn Driver>> {
            if self.stages == 0 {
                return None;
            }
            let stages = (0..self.stages)
                .map(|i| Stage::new(format!("s{i}"), format!("Stage {i}")))
                .collect();
            Some(Box::new(
                PipelineDriver::new("/pipeline", "Board", stages)
                    .timing(config.tick_interval(), config.cooldown()),
            ))
        }
    }

    fn kinds(frames: &[Frame]) -> Vec<&'static str> {
        frames
            .iter()
            .map(|f| f.message().map_or("keepalive", Message::kind))
            .collect()
    }

    fn status(frame: &Frame) -> String {
        match frame.message() {
            Some(Message::UpdateDataModel { value, .. }) => {
                value["statusMessage"].as_str().unwrap().to_string()
            }
            other => panic!("expected an update, got {other:?}"),
        }
    }

    async fn take(down: &mut Downstream, n: usize) -> Vec<Frame> {
        let mut out = vec![];
        while out.len() < n {
            match down.recv().await {
                Some(f) => out.push(f),
                None => break,
            }
        }
        out
    }

    fn engine(stages: usize) -> Engine {
        Engine::default().with_agent(Board {
            send_model: true,
            stages,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn handshake_order() -> Result<()> {
        let mut down = engine(0).open("board")?;
        let frames = take(&mut down, 3).await;
        assert_eq!(
            kinds(&frames),
            ["createSurface", "updateDataModel", "updateComponents"]
        );
        assert!(down.try_recv().is_none());
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn presentation_only_skips_model() -> Result<()> {
        let engine = Engine::default().with_agent(Board {
            send_model: false,
            stages: 0,
        });
        let mut down = engine.open("board")?;
        let frames = take(&mut down, 2).await;
        assert_eq!(kinds(&frames), ["createSurface", "updateComponents"]);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn keepalive_after_idle() -> Result<()> {
        let mut down = engine(0).open("board")?;
        take(&mut down, 3).await;
        let start = time::Instant::now();
        assert_eq!(down.recv().await, Some(Frame::Keepalive));
        assert_eq!(start.elapsed(), Duration::from_secs(30));
        assert_eq!(down.recv().await, Some(Frame::Keepalive));
        assert_eq!(start.elapsed(), Duration::from_secs(60));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn driver_cycles() -> Result<()> {
        let mut down = engine(2).open("board")?;
        let handshake = take(&mut down, 3).await;
        let Some(Message::UpdateDataModel { value, .. }) = handshake[1].message() else {
            panic!("expected the model snapshot");
        };
        assert_eq!(value["pipeline"]["statusMessage"], json!("Waiting to start..."));

        let start = time::Instant::now();
        let ticks = take(&mut down, 4).await;
        let messages: Vec<_> = ticks.iter().map(status).collect();
        assert_eq!(
            messages,
            [
                "Step 1/2: Stage 0",
                "Step 2/2: Stage 1",
                "All steps completed! Restarting in 3s...",
                "Pipeline reset. Starting...",
            ]
        );
        // Three 2s steps and one 3s cool-down.
        assert_eq!(start.elapsed(), Duration::from_secs(9));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn driver_output_suppresses_keepalive() -> Result<()> {
        let mut down = engine(3).open("board")?;
        take(&mut down, 3).await;
        for f in take(&mut down, 40).await {
            assert_ne!(f, Frame::Keepalive);
        }
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn drop_cancels_session() -> Result<()> {
        let engine = engine(2);
        let down = engine.open("board")?;
        let surface = down.surface().clone();
        assert_eq!(engine.open_sessions("board"), 1);
        drop(down);
        time::sleep(Duration::from_millis(10)).await;
        assert_eq!(engine.open_sessions("board"), 0);
        assert!(!surface.is_open());
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn delete_ends_stream() -> Result<()> {
        let engine = engine(0);
        let mut down = engine.open("board")?;
        take(&mut down, 3).await;
        assert_eq!(engine.delete("board"), 1);
        assert_eq!(kinds(&take(&mut down, 1).await), ["deleteSurface"]);
        assert_eq!(down.recv().await, None);
        assert_eq!(engine.delete("board"), 0);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn independent_sessions_do_not_share() -> Result<()> {
        let engine = engine(0);
        let a = engine.open("board")?;
        let b = engine.open("board")?;
        engine.patch_session(a.key(), &"/pipeline".into(), json!("a"))?;
        assert_eq!(engine.snapshot_of(a.key())?["pipeline"], json!("a"));
        assert_eq!(engine.snapshot_of(b.key())?["pipeline"], json!({}));
        assert_eq!(b.surface().snapshot()["pipeline"], json!({}));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn shared_mode_replays_current_state() -> Result<()> {
        let config = Config {
            session_mode: SessionMode::Shared,
            ..Config::default()
        };
        let engine = Engine::new(config).with_agent(Board {
            send_model: true,
            stages: 3,
        });
        let mut first = engine.open("board")?;
        take(&mut first, 3).await;
        let ticks = take(&mut first, 2).await;
        assert_eq!(status(&ticks[1]), "Step 2/3: Stage 1");

        let mut late = engine.open("board")?;
        let handshake = take(&mut late, 3).await;
        let Some(Message::UpdateDataModel { value, .. }) = handshake[1].message() else {
            panic!("expected the model snapshot");
        };
        assert_eq!(value["pipeline"]["statusMessage"], json!("Step 2/3: Stage 1"));

        // Both connections see the next tick.
        assert_eq!(status(&take(&mut first, 1).await[0]), "Step 3/3: Stage 2");
        assert_eq!(status(&take(&mut late, 1).await[0]), "Step 3/3: Stage 2");
        assert_eq!(engine.open_sessions("board"), 2);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn shared_surface_released_with_last_connection() -> Result<()> {
        let config = Config {
            session_mode: SessionMode::Shared,
            ..Config::default()
        };
        let engine = Engine::new(config).with_agent(Board {
            send_model: true,
            stages: 0,
        });
        let a = engine.open("board")?;
        let b = engine.open("board")?;
        let surface = a.surface().clone();
        drop(a);
        time::sleep(Duration::from_millis(10)).await;
        assert!(surface.is_open());
        drop(b);
        time::sleep(Duration::from_millis(10)).await;
        assert!(!surface.is_open());
        assert_eq!(engine.open_sessions("board"), 0);
        Ok(())
    }
}
