#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod command;

pub use command::{CommandSpec, Output, Runner, SystemRunner};
