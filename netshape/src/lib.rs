#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

//! Per-interface network impairment through Linux traffic control.
//!
//! ```no_run
//! use netshape::{discovery::Discovery as _, LinkController, LinkParameters, SysfsDiscovery};
//!
//! let controller = LinkController::system();
//! let params = LinkParameters::default().with_latency(100).with_jitter(10).with_packet_loss(5);
//!
//! for interface in SysfsDiscovery::new().interfaces("veth")? {
//!     controller.apply_flat(&interface, &params)?;
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use netshape_common::command;
pub use netshape_common::{CommandSpec, Output, Runner, SystemRunner};
pub use netshape_tc::*;
pub use netshape_tc::discovery::SysfsDiscovery;
