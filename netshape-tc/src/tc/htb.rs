//! HTB (Hierarchical Token Bucket) bandwidth classing.
//!
//! Classed mode is three commands, each depending on the previous one:
//!
//! 1. the HTB root qdisc `1:` with a default class id,
//! 2. class `1:1` under it, optionally rate limited,
//! 3. a `matchall` filter steering all IP traffic into `1:1`.
//!
//! The root and the class each get their own verb. A sequence that failed at the class leaves
//! the root behind, and the next call has to `change` the root but `add` the class.

use netshape_common::CommandSpec;

use super::{Clause, Stage, Step, Verb, TC_PROGRAM};
use crate::{
    params::LinkParameters,
    probe::{LinkState, ProbeResult},
};

/// Handle of the HTB root qdisc.
pub const HTB_ROOT_HANDLE: &str = "1:";

/// Minor number HTB routes unclassified traffic to (`default` parameter).
pub const HTB_DEFAULT_CLASS: u32 = 20;

/// The class all traffic is steered into.
pub const HTB_CLASS_ID: &str = "1:1";

/// Priority of the catch-all filter.
pub const FILTER_PRIORITY: u32 = 1;

/// Builds `tc qdisc <verb> dev <interface> root handle 1: htb default 20`.
pub fn root_qdisc(interface: &str, verb: Verb) -> CommandSpec {
    CommandSpec::new(TC_PROGRAM)
        .args(["qdisc", verb.as_str(), "dev", interface, "root", "handle", HTB_ROOT_HANDLE, "htb"])
        .args(["default".to_string(), HTB_DEFAULT_CLASS.to_string()])
}

/// The clause of the HTB class: rate and ceiling when `upload_bandwidth` is set, nothing
/// otherwise (unbounded within the parent).
pub fn class_clause(params: &LinkParameters) -> Option<Clause> {
    (params.upload_bandwidth > 0).then_some(Clause::ClassRate(params.upload_bandwidth))
}

/// Builds `tc class <verb> dev <interface> parent 1: classid 1:1 htb [rate <U> ceil <U>]`.
pub fn class(interface: &str, params: &LinkParameters, verb: Verb) -> CommandSpec {
    let mut args: Vec<String> = [
        "class",
        verb.as_str(),
        "dev",
        interface,
        "parent",
        HTB_ROOT_HANDLE,
        "classid",
        HTB_CLASS_ID,
        "htb",
    ]
    .into_iter()
    .map(String::from)
    .collect();

    if let Some(clause) = class_clause(params) {
        clause.write_args(&mut args);
    }

    CommandSpec::new(TC_PROGRAM).args(args)
}

/// Builds `tc filter add dev <interface> protocol ip parent 1: prio 1 matchall flowid 1:1`.
///
/// The filter is always added, regardless of the probed state.
pub fn filter(interface: &str) -> CommandSpec {
    CommandSpec::new(TC_PROGRAM)
        .args(["filter", "add", "dev", interface, "protocol", "ip", "parent", HTB_ROOT_HANDLE])
        .args(["prio".to_string(), FILTER_PRIORITY.to_string()])
        .args(["matchall", "flowid", HTB_CLASS_ID])
}

/// Builds `tc class show dev <interface>`, the listing scanned for [`HTB_CLASS_ID`].
pub fn class_listing(interface: &str) -> CommandSpec {
    CommandSpec::new(TC_PROGRAM).args(["class", "show", "dev", interface])
}

/// Builds the three classed-mode steps, in execution order.
pub fn build(interface: &str, params: &LinkParameters, state: LinkState) -> Vec<Step> {
    // A class can't outlive its root.
    let class_state =
        if state.root.is_configured() { state.class } else { ProbeResult::Uninitialized };

    vec![
        Step::new(Stage::ParentQdisc, root_qdisc(interface, Verb::from(state.root))),
        Step::new(Stage::Class, class(interface, params, Verb::from(class_state))),
        Step::new(Stage::Filter, filter(interface)),
    ]
}
