//! Discovery of the current traffic control state of an interface.
//!
//! The kernel's qdisc and class tables are the only source of truth: nothing is cached between
//! calls, every probe lists them again.

use netshape_common::{command, Runner};

use crate::tc::{self, htb, Discipline, Mode};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to list traffic control state: {0}")]
    Listing(#[from] command::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Whether an interface already has the probed discipline attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeResult {
    /// No matching discipline; the next command must create it.
    Uninitialized,
    /// The discipline exists; the next command must modify it.
    Configured,
}

impl ProbeResult {
    pub const fn is_configured(self) -> bool {
        matches!(self, Self::Configured)
    }
}

/// The probed state of everything a [`Mode`] configures on an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkState {
    /// The root discipline of the mode.
    pub root: ProbeResult,
    /// The HTB class. Only probed in classed mode, when the HTB root exists.
    pub class: ProbeResult,
}

impl LinkState {
    pub const fn new(root: ProbeResult, class: ProbeResult) -> Self {
        Self { root, class }
    }

    /// Nothing attached yet.
    pub const fn uninitialized() -> Self {
        Self::new(ProbeResult::Uninitialized, ProbeResult::Uninitialized)
    }
}

/// Scans a `tc qdisc show` listing for `discipline` on `interface`.
///
/// A line matches when it contains both the interface name and the discipline marker, as plain
/// substrings. This is permissive: `veth1` also matches a line about `veth10`.
pub fn parse_listing(listing: &str, interface: &str, discipline: Discipline) -> ProbeResult {
    let marker = discipline.marker();

    if listing.lines().any(|line| line.contains(interface) && line.contains(marker)) {
        ProbeResult::Configured
    } else {
        ProbeResult::Uninitialized
    }
}

/// Scans a `tc class show` listing for a class with id `class_id`.
///
/// The id must appear as a whole word, so `1:1` doesn't match `1:10`.
pub fn parse_class_listing(listing: &str, class_id: &str) -> ProbeResult {
    if listing.lines().any(|line| line.split_whitespace().any(|word| word == class_id)) {
        ProbeResult::Configured
    } else {
        ProbeResult::Uninitialized
    }
}

/// Queries the qdisc and class tables through a [`Runner`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Prober;

impl Prober {
    pub fn new() -> Self {
        Self
    }

    /// Lists all qdiscs and reports whether `interface` has `discipline` attached.
    pub fn probe<R: Runner + ?Sized>(
        &self,
        runner: &R,
        interface: &str,
        discipline: Discipline,
    ) -> Result<ProbeResult> {
        self.probe_any(runner, interface, &[discipline])
    }

    /// Like [`Prober::probe`], reporting [`ProbeResult::Configured`] if any of `disciplines` is
    /// attached. The qdisc table is listed once.
    pub fn probe_any<R: Runner + ?Sized>(
        &self,
        runner: &R,
        interface: &str,
        disciplines: &[Discipline],
    ) -> Result<ProbeResult> {
        let listing = runner.run(&tc::listing())?.combined();

        let state = disciplines
            .iter()
            .map(|&discipline| parse_listing(&listing, interface, discipline))
            .find(|state| state.is_configured())
            .unwrap_or(ProbeResult::Uninitialized);

        tracing::debug!(interface, ?disciplines, ?state, "probed qdisc state");

        Ok(state)
    }

    /// Lists the classes of `interface` and reports whether the HTB class exists.
    pub fn probe_class<R: Runner + ?Sized>(
        &self,
        runner: &R,
        interface: &str,
    ) -> Result<ProbeResult> {
        let listing = runner.run(&htb::class_listing(interface))?.combined();
        let state = parse_class_listing(&listing, htb::HTB_CLASS_ID);

        tracing::debug!(interface, class = htb::HTB_CLASS_ID, ?state, "probed class state");

        Ok(state)
    }

    /// Probes everything `mode` configures on `interface`.
    ///
    /// In classed mode the class is probed on its own, since a failed sequence can leave the
    /// HTB root without its class. Without a root there can be no class, so the class table is
    /// only listed when the root exists.
    pub fn probe_link<R: Runner + ?Sized>(
        &self,
        runner: &R,
        interface: &str,
        mode: Mode,
    ) -> Result<LinkState> {
        let root = self.probe(runner, interface, mode.discipline())?;

        let class = match mode {
            Mode::Classed if root.is_configured() => self.probe_class(runner, interface)?,
            _ => ProbeResult::Uninitialized,
        };

        Ok(LinkState::new(root, class))
    }
}
