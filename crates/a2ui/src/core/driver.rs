//! Temporal drivers: clock-paced producers of data model patches.
//!
//! A driver is a plain state value. The session that owns it asks for the
//! delay until the next tick, sleeps, then calls [`Driver::tick`]. Nothing
//! here touches a clock, so the state machines are tested without one.

use std::{cmp::Ordering, time::Duration};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{dispatch::Patch, path::DataPath};

/// A clock-paced data model producer.
pub trait Driver: Send {
    /// The value the driver's path holds before the first tick.
    fn initial(&self) -> Patch;

    /// Advance one step and return the patch describing the new state.
    fn tick(&mut self) -> Patch;

    /// How long to wait before the next tick.
    fn next_delay(&self) -> Duration;
}

/// A pipeline stage descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    /// Stage id.
    pub id: String,
    /// Display label.
    pub label: String,
}

impl Stage {
    /// Construct a stage.
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Status of one stage at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    /// Not reached yet.
    Pending,
    /// Currently running. At most one stage is active.
    Active,
    /// Done.
    Completed,
}

/// A stage with its current status, as published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageState {
    /// Stage id.
    pub id: String,
    /// Display label.
    pub label: String,
    /// Current status.
    pub status: StageStatus,
}

/// The full published pipeline value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineView {
    /// Pipeline title.
    pub title: String,
    /// Every stage, in order.
    pub states: Vec<StageState>,
    /// Human-readable status line.
    pub status_message: String,
}

/// Where the pipeline is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Freshly reset; the next tick activates stage 0.
    Reset,
    /// Walking the stages.
    Advancing,
    /// Every stage completed; the next tick, after the cool-down, resets.
    Completed,
}

/// Drives a pipeline through its stages forever:
/// reset, advance once per stage, all completed, cool-down, reset again.
#[derive(Debug, Clone)]
pub struct PipelineDriver {
    /// Data model path of the pipeline value.
    path: DataPath,
    /// Pipeline title.
    title: String,
    /// Stage descriptors.
    stages: Vec<Stage>,
    /// Step counter: the number of stages activated so far in this run.
    step: usize,
    /// Cycle phase.
    phase: Phase,
    /// Delay between steps.
    interval: Duration,
    /// Delay between the all-completed frame and the reset frame.
    cooldown: Duration,
}

impl PipelineDriver {
    /// Construct a driver publishing at `path`.
    pub fn new(path: impl Into<DataPath>, title: impl Into<String>, stages: Vec<Stage>) -> Self {
        Self {
            path: path.into(),
            title: title.into(),
            stages,
            step: 0,
            phase: Phase::Reset,
            interval: Duration::from_secs(2),
            cooldown: Duration::from_secs(3),
        }
    }

    /// Set the tick interval and cool-down.
    pub fn timing(mut self, interval: Duration, cooldown: Duration) -> Self {
        self.interval = interval;
        self.cooldown = cooldown;
        self
    }

    /// The step counter.
    pub fn step(&self) -> usize {
        self.step
    }

    /// The current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Build the published value with `status` deciding each stage.
    fn view(&self, message: String, status: impl Fn(usize) -> StageStatus) -> PipelineView {
        PipelineView {
            title: self.title.clone(),
            states: self
                .stages
                .iter()
                .enumerate()
                .map(|(i, s)| StageState {
                    id: s.id.clone(),
                    label: s.label.clone(),
                    status: status(i),
                })
                .collect(),
            status_message: message,
        }
    }

    /// Wrap a view in a patch at the pipeline path.
    fn patch(&self, view: &PipelineView) -> Patch {
        // A struct of strings always serializes.
        let value = serde_json::to_value(view).unwrap_or(Value::Null);
        Patch::new(self.path.clone(), value)
    }

    /// The all-pending value with a message.
    fn pending(&self, message: &str) -> PipelineView {
        self.view(message.to_string(), |_| StageStatus::Pending)
    }
}

impl Driver for PipelineDriver {
    fn initial(&self) -> Patch {
        self.patch(&self.pending("Waiting to start..."))
    }

    fn tick(&mut self) -> Patch {
        let n = self.stages.len();
        let view = match self.phase {
            Phase::Completed => {
                self.step = 0;
                self.phase = Phase::Reset;
                self.pending("Pipeline reset. Starting...")
            }
            Phase::Reset | Phase::Advancing if self.step < n => {
                let k = self.step;
                self.step += 1;
                self.phase = Phase::Advancing;
                let msg = format!("Step {}/{}: {}", k + 1, n, self.stages[k].label);
                self.view(msg, |i| match i.cmp(&k) {
                    Ordering::Less => StageStatus::Completed,
                    Ordering::Equal => StageStatus::Active,
                    Ordering::Greater => StageStatus::Pending,
                })
            }
            Phase::Reset | Phase::Advancing => {
                self.phase = Phase::Completed;
                let msg = format!(
                    "All steps completed! Restarting in {}s...",
                    self.cooldown.as_secs_f64()
                );
                self.view(msg, |_| StageStatus::Completed)
            }
        };
        tracing::debug!("pipeline {}: {}", self.path, view.status_message);
        self.patch(&view)
    }

    fn next_delay(&self) -> Duration {
        match self.phase {
            Phase::Completed => self.cooldown,
            Phase::Reset | Phase::Advancing => self.interval,
        }
    }
}
