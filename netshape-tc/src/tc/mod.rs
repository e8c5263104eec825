//! # Traffic Control Commands
//!
//! This module builds the `tc` invocations that shape a single interface. Building is pure: the
//! functions here never touch the system, they only describe what to run and in which order.
//!
//! ## Modes
//!
//! Two layouts are supported.
//!
//! **Flat**: a single netem qdisc at the root of the interface applies delay, jitter, rate and
//! loss to every packet.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  Netem root qdisc                            │
//! │  delay <L>ms [<J>ms distribution normal]     │
//! │  [rate <B>] [loss <P>%]                      │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! **Classed**: an HTB root qdisc with a single class that all IP traffic is steered into by a
//! `matchall` filter. The class carries the upload rate and ceiling.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  HTB root qdisc (1:0), default 20            │
//! └──────────────────────────────────────────────┘
//!                        │
//!                        ▼
//! ┌──────────────────────────────────────────────┐
//! │  Class 1:1  [rate <U> ceil <U>]              │◀── matchall filter, prio 1, protocol ip
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Verbs
//!
//! The kernel refuses `tc qdisc add` on an interface that already has the discipline, and
//! `tc qdisc change` on one that doesn't, and the same goes for classes. Verbs are therefore
//! derived from a fresh [`LinkState`]: `add` when uninitialized, `change` when configured.

use std::fmt;

use netshape_common::CommandSpec;

use crate::{
    params::LinkParameters,
    probe::{LinkState, ProbeResult},
};

pub mod clause;
pub mod htb;
pub mod netem;

pub use clause::Clause;

/// The traffic control program.
pub const TC_PROGRAM: &str = "tc";

/// Queueing disciplines the prober can look for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Discipline {
    /// The network emulator, used in flat mode.
    Netem,
    /// The hierarchical token bucket, root of the classed mode.
    Htb,
}

impl Discipline {
    /// The marker `tc qdisc show` prints for this discipline.
    pub const fn marker(self) -> &'static str {
        match self {
            Self::Netem => "netem",
            Self::Htb => "htb",
        }
    }
}

impl fmt::Display for Discipline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker())
    }
}

/// The `tc` verb used for qdisc and class commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Add,
    Change,
}

impl Verb {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Change => "change",
        }
    }
}

impl From<ProbeResult> for Verb {
    fn from(state: ProbeResult) -> Self {
        match state {
            ProbeResult::Uninitialized => Self::Add,
            ProbeResult::Configured => Self::Change,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The shaping layout to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Flat,
    Classed,
}

impl Mode {
    /// The root discipline whose presence decides between `add` and `change`.
    pub const fn discipline(self) -> Discipline {
        match self {
            Self::Flat => Discipline::Netem,
            Self::Classed => Discipline::Htb,
        }
    }
}

/// The logical stage a command belongs to. Reported when the command fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// The flat netem root qdisc.
    Netem,
    /// The HTB root qdisc.
    ParentQdisc,
    /// The HTB class carrying the upload bandwidth.
    Class,
    /// The catch-all filter steering traffic into the class.
    Filter,
    /// Removal of the root qdisc.
    Teardown,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Netem => "netem qdisc",
            Self::ParentQdisc => "parent qdisc",
            Self::Class => "class",
            Self::Filter => "filter",
            Self::Teardown => "teardown",
        };
        f.write_str(s)
    }
}

/// A command together with the stage it implements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub stage: Stage,
    pub command: CommandSpec,
}

impl Step {
    pub fn new(stage: Stage, command: CommandSpec) -> Self {
        Self { stage, command }
    }
}

/// Builds the ordered steps that bring `interface` to `params` under `mode`, given its probed
/// state.
pub fn build(interface: &str, params: &LinkParameters, mode: Mode, state: LinkState) -> Vec<Step> {
    match mode {
        Mode::Flat => vec![Step::new(Stage::Netem, netem::build(interface, params, state.root))],
        Mode::Classed => htb::build(interface, params, state),
    }
}

/// Builds `tc qdisc del dev <interface> root`, removing whatever root discipline is attached.
pub fn teardown(interface: &str) -> CommandSpec {
    CommandSpec::new(TC_PROGRAM).args(["qdisc", "del", "dev", interface, "root"])
}

/// Builds `tc qdisc show`, the listing the prober scans.
pub fn listing() -> CommandSpec {
    CommandSpec::new(TC_PROGRAM).args(["qdisc", "show"])
}
