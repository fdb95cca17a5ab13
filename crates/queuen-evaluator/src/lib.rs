#![doc = include_str!("../README.md")]

mod builder;
mod driver;
mod queue;

pub use crate::builder::{build, BuildError};
pub use crate::driver::{stirfry, Driver, EvalError, Listed, DEFAULT_PROBE_BUDGET};
pub use crate::queue::Queue;
