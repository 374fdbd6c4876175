//! Downstream sessions.
//!
//! Each open downstream channel is served by one task. The task sleeps until
//! something needs doing: the transport went away, the engine cancelled the
//! session, a frame arrived on the shared feed, or the next scheduled deadline
//! (driver tick or keepalive) came due.

use std::{future, time::Duration};

use tokio::{
    select,
    sync::{
        broadcast::{self, error::RecvError},
        mpsc, watch,
    },
    task::JoinHandle,
    time::{self, Instant},
};

use crate::{
    SessionKey,
    codec::Framing,
    driver::Driver,
    error::Result,
    message::{Frame, Message},
    outbox::Outbox,
    schedule::{Schedule, Wake},
    surface::SurfaceHandle,
};

/// The receiving end of a downstream channel.
///
/// Dropping it cancels the session: the serving task is aborted at its next
/// suspension point and the session is unregistered from the engine.
#[derive(Debug)]
pub struct Downstream {
    /// Registry key of this session.
    key: SessionKey,
    /// Outbound frames.
    rx: mpsc::Receiver<Frame>,
    /// Serving task.
    task: JoinHandle<()>,
    /// Non-emitting view of the session's surface.
    surface: SurfaceHandle,
    /// Wire framing for [`Downstream::next_encoded`].
    framing: Framing,
}

impl Downstream {
    /// Wrap a running session.
    pub(crate) fn new(
        key: SessionKey,
        rx: mpsc::Receiver<Frame>,
        task: JoinHandle<()>,
        surface: SurfaceHandle,
        framing: Framing,
    ) -> Self {
        Self {
            key,
            rx,
            task,
            surface,
            framing,
        }
    }

    /// The key addressing this session in [`crate::Engine::post_to`] and
    /// the other per-session engine calls.
    pub fn key(&self) -> SessionKey {
        self.key
    }

    /// The next frame, or None once the session has ended.
    pub async fn recv(&mut self) -> Option<Frame> {
        self.rx.recv().await
    }

    /// A frame if one is ready now.
    pub fn try_recv(&mut self) -> Option<Frame> {
        self.rx.try_recv().ok()
    }

    /// The next frame encoded for the wire.
    pub async fn next_encoded(&mut self) -> Option<Result<String>> {
        let frame = self.rx.recv().await?;
        Some(self.framing.encode(&frame))
    }

    /// A view of the surface this session shows. Changes made through it
    /// are not emitted; use [`crate::Engine::patch`] to push updates.
    pub fn surface(&self) -> &SurfaceHandle {
        &self.surface
    }

    /// Wire framing.
    pub fn framing(&self) -> Framing {
        self.framing
    }

    /// True once the serving task has ended.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for Downstream {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// The answer to one upstream request, streamed on its own channel. The
/// stream ends when the request has been handled.
#[derive(Debug)]
pub struct Upstream {
    /// Response frames.
    rx: mpsc::Receiver<Frame>,
}

impl Upstream {
    /// Wrap a response channel.
    pub(crate) fn new(rx: mpsc::Receiver<Frame>) -> Self {
        Self { rx }
    }

    /// The next response frame, or None when the response is complete.
    pub async fn recv(&mut self) -> Option<Frame> {
        self.rx.recv().await
    }

    /// Collect the whole response.
    pub async fn collect(mut self) -> Vec<Frame> {
        let mut out = vec![];
        while let Some(f) = self.rx.recv().await {
            out.push(f);
        }
        out
    }
}

/// Everything a session task owns.
pub(crate) struct Session<G> {
    /// The surface, emitting straight into `tx` in independent mode.
    pub surface: SurfaceHandle,
    /// Outbound channel.
    pub tx: mpsc::Sender<Frame>,
    /// Driver run by this session, if any.
    pub driver: Option<Box<dyn Driver>>,
    /// Shared surface feed, if attached to one.
    pub feed: Option<broadcast::Receiver<Frame>>,
    /// Engine-side cancellation.
    pub cancel: watch::Receiver<bool>,
    /// Idle period before a keepalive.
    pub keepalive: Duration,
    /// Released when the task ends, however it ends.
    pub guard: G,
}

/// The next frame from the shared feed. Never resolves without a feed.
async fn next_shared(feed: &mut Option<broadcast::Receiver<Frame>>) -> Option<Frame> {
    let Some(rx) = feed else {
        return future::pending().await;
    };
    loop {
        match rx.recv().await {
            Ok(f) => return Some(f),
            Err(RecvError::Lagged(n)) => {
                tracing::warn!("shared feed lagged, {} frames dropped", n);
            }
            Err(RecvError::Closed) => return None,
        }
    }
}

/// Serve one downstream channel until it closes or is cancelled.
pub(crate) async fn run<G: Send>(session: Session<G>) {
    let Session {
        surface,
        tx,
        mut driver,
        mut feed,
        mut cancel,
        keepalive,
        guard,
    } = session;
    let out = Outbox::Channel(tx.clone());
    let id = surface.id();
    let start = Instant::now();
    let mut schedule = Schedule::new(start, keepalive);
    if let Some(d) = &driver {
        schedule.tick_in(start, d.next_delay());
    }
    tracing::debug!("session for {} started", id);

    loop {
        let Some((deadline, _)) = schedule.next() else {
            break;
        };
        select! {
            biased;
            () = tx.closed() => {
                tracing::debug!("{}: downstream closed", id);
                break;
            }
            frame = next_shared(&mut feed) => {
                let Some(frame) = frame else {
                    tracing::debug!("{}: shared feed ended", id);
                    break;
                };
                let last = matches!(frame, Frame::Message(Message::DeleteSurface { .. }));
                out.send(frame);
                schedule.emitted(Instant::now());
                if last {
                    break;
                }
            }
            _ = cancel.changed() => {
                tracing::debug!("{}: session cancelled", id);
                break;
            }
            () = time::sleep_until(deadline) => {
                let now = Instant::now();
                for wake in schedule.collect(now) {
                    match wake {
                        Wake::Tick => {
                            let Some(d) = driver.as_mut() else { continue };
                            if surface.apply(vec![d.tick()]) > 0 {
                                schedule.emitted(now);
                            }
                            schedule.tick_in(now, d.next_delay());
                        }
                        Wake::Keepalive => {
                            tracing::trace!("{}: keepalive", id);
                            out.send(Frame::Keepalive);
                            schedule.emitted(now);
                        }
                    }
                }
            }
        }
    }
    drop(guard);
    tracing::debug!("session for {} ended", id);
}

/// Run a shared surface's driver until the surface closes. Patches go out
/// through the surface's own broadcast outbox.
pub(crate) async fn drive(surface: SurfaceHandle, mut driver: Box<dyn Driver>) {
    loop {
        time::sleep(driver.next_delay()).await;
        if !surface.is_open() {
            break;
        }
        surface.apply(vec![driver.tick()]);
    }
    tracing::debug!("driver for {} stopped", surface.id());
}
