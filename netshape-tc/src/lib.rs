#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod controller;
pub mod discovery;
pub mod lock;
pub mod params;
pub mod probe;
pub mod tc;

pub use controller::LinkController;
pub use params::LinkParameters;
pub use probe::{LinkState, ProbeResult, Prober};
pub use tc::{Discipline, Mode, Stage, Step};
