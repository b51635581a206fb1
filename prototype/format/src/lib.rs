#![cfg_attr(not(test), no_std)]

pub mod host_to_device;
pub mod transition;

pub use host_to_device::{Channel, Valve, ValveState};
pub use transition::{Transition, UnknownTransition};

/// Size of a single command frame on the wire
pub const FRAME_SIZE: usize = 1;
