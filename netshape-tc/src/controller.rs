//! The link shaping controller.
//!
//! Every operation follows the same protocol:
//!
//! 1. probe the qdisc table for the interface, and the class table in classed mode,
//! 2. build the command sequence for the probed state,
//! 3. run the commands in order, stopping at the first failure.
//!
//! There are no retries and no rollback. A failed classed sequence can leave the root qdisc in
//! place without its class or filter. Calling the same operation again is the recovery path:
//! the root and the class are probed separately, so existing steps get `change` and missing
//! ones get `add`.
//!
//! # Concurrency
//!
//! Operations on the same interface are serialized through [`InterfaceLocks`], held for the whole
//! probe → build → run sequence. The locks only cover callers sharing them: clones of a
//! [`LinkController`] do, independent controllers or other processes don't. Operations on
//! different interfaces run independently.

use std::sync::Arc;

use netshape_common::{command, CommandSpec, Runner, SystemRunner};

use crate::{
    lock::InterfaceLocks,
    params::{self, LinkParameters},
    probe::{self, ProbeResult, Prober},
    tc::{self, Discipline, Mode, Stage, Step},
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid link parameters: {0}")]
    InvalidParameters(#[from] params::Error),
    #[error("probe error: {0}")]
    Probe(#[from] probe::Error),
    #[error("{stage} command failed (`{command}`): {source}")]
    Command {
        stage: Stage,
        command: CommandSpec,
        #[source]
        source: command::Error,
    },
}

impl Error {
    /// The stage whose command failed, if the error comes from running a command.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Command { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Applies link shaping to single interfaces through a [`Runner`].
#[derive(Debug, Clone)]
pub struct LinkController<R> {
    runner: R,
    prober: Prober,
    locks: Arc<InterfaceLocks>,
}

impl LinkController<SystemRunner> {
    /// A controller running `tc` as a child process.
    pub fn system() -> Self {
        Self::new(SystemRunner::new())
    }
}

impl<R: Runner> LinkController<R> {
    pub fn new(runner: R) -> Self {
        Self { runner, prober: Prober::new(), locks: Arc::default() }
    }

    /// Share `locks` with other controllers driving the same interfaces.
    pub fn with_locks(mut self, locks: Arc<InterfaceLocks>) -> Self {
        self.locks = locks;
        self
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn locks(&self) -> &Arc<InterfaceLocks> {
        &self.locks
    }

    /// Reports whether `interface` currently has `discipline` attached.
    pub fn probe(&self, interface: &str, discipline: Discipline) -> Result<ProbeResult> {
        Ok(self.prober.probe(&self.runner, interface, discipline)?)
    }

    /// Applies `params` as a flat netem qdisc at the root of `interface`.
    pub fn apply_flat(&self, interface: &str, params: &LinkParameters) -> Result<()> {
        self.apply(interface, params, Mode::Flat)
    }

    /// Applies `params` as an HTB root qdisc with a single rate limited class and a catch-all
    /// filter.
    pub fn apply_classed(&self, interface: &str, params: &LinkParameters) -> Result<()> {
        self.apply(interface, params, Mode::Classed)
    }

    /// Applies `params` to `interface` in the given `mode`.
    pub fn apply(&self, interface: &str, params: &LinkParameters, mode: Mode) -> Result<()> {
        params.validate()?;

        self.locks.with(interface, || -> Result<()> {
            let state = self.prober.probe_link(&self.runner, interface, mode)?;
            let steps = tc::build(interface, params, mode, state);

            self.execute(interface, steps)?;

            tracing::info!(interface, ?mode, ?state, ?params, "link shaping applied");
            Ok(())
        })
    }

    /// Removes the root netem or htb qdisc from `interface`.
    ///
    /// Returns `false` without running anything if neither is attached.
    pub fn clear(&self, interface: &str) -> Result<bool> {
        self.locks.with(interface, || -> Result<bool> {
            let state = self.prober.probe_any(
                &self.runner,
                interface,
                &[Discipline::Netem, Discipline::Htb],
            )?;

            if !state.is_configured() {
                tracing::debug!(interface, "no shaping to clear");
                return Ok(false);
            }

            self.execute(interface, vec![Step::new(Stage::Teardown, tc::teardown(interface))])?;

            tracing::info!(interface, "link shaping cleared");
            Ok(true)
        })
    }

    fn execute(&self, interface: &str, steps: Vec<Step>) -> Result<()> {
        for Step { stage, command } in steps {
            if let Err(source) = self.runner.run(&command) {
                tracing::warn!(
                    interface,
                    %stage,
                    %command,
                    %source,
                    "shaping step failed, aborting"
                );
                return Err(Error::Command { stage, command, source });
            }
        }

        Ok(())
    }
}
