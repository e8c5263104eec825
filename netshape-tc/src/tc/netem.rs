//! Flat netem shaping.

use netshape_common::CommandSpec;

use super::{Clause, Verb, TC_PROGRAM};
use crate::{params::LinkParameters, probe::ProbeResult};

/// The clauses for `params`, in netem grammar order.
///
/// The delay clause is always present, even at `0ms`: a netem qdisc created without one can't
/// later be `change`d with delay options reliably, so we always keep it in place.
pub fn clauses(params: &LinkParameters) -> Vec<Clause> {
    let mut clauses = Vec::with_capacity(4);
    clauses.push(Clause::Delay(params.latency));

    if params.jitter > 0 {
        clauses.push(Clause::Jitter(params.jitter));
    }

    if params.bandwidth > 0 {
        clauses.push(Clause::Rate(params.bandwidth));
    }

    if params.packet_loss > 0 {
        clauses.push(Clause::Loss(params.packet_loss));
    }

    clauses
}

/// Builds `tc qdisc <add|change> dev <interface> root netem <clauses>`.
pub fn build(interface: &str, params: &LinkParameters, state: ProbeResult) -> CommandSpec {
    let verb = Verb::from(state);

    let mut args: Vec<String> = ["qdisc", verb.as_str(), "dev", interface, "root", "netem"]
        .into_iter()
        .map(String::from)
        .collect();
    for clause in clauses(params) {
        clause.write_args(&mut args);
    }

    CommandSpec::new(TC_PROGRAM).args(args)
}
