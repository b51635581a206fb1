use core::fmt;

#[cfg(feature = "defmt")]
use defmt::Format;

use crate::{Transition, FRAME_SIZE};

/// One of the four solenoid valves on the rig.
/// The discriminant is the bit index in the command frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(Format))]
#[repr(u8)]
pub enum Valve {
    BOut = 0,
    AOut = 1,
    BIn = 2,
    AIn = 3,
}

impl Valve {
    pub const ALL: [Valve; 4] = [Valve::AIn, Valve::AOut, Valve::BIn, Valve::BOut];

    pub const fn mask(self) -> u8 {
        1 << self as u8
    }

    pub const fn channel(self) -> Channel {
        match self {
            Valve::AIn | Valve::AOut => Channel::A,
            Valve::BIn | Valve::BOut => Channel::B,
        }
    }
}

/// A half of the rig. `A` is the left side, `B` the right side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(Format))]
pub enum Channel {
    A,
    B,
}

impl Channel {
    pub const fn inlet(self) -> Valve {
        match self {
            Channel::A => Valve::AIn,
            Channel::B => Valve::BIn,
        }
    }

    pub const fn outlet(self) -> Valve {
        match self {
            Channel::A => Valve::AOut,
            Channel::B => Valve::BOut,
        }
    }

    /// Both valve bits belonging to this channel
    pub const fn mask(self) -> u8 {
        self.inlet().mask() | self.outlet().mask()
    }
}

/// The 4-bit valve command the host keeps sending to the rig.
///
/// Bit layout, LSB first: `B_OUT`, `A_OUT`, `B_IN`, `A_IN`. Bits 4 to 7
/// are reserved and always zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "defmt", derive(Format))]
#[repr(transparent)]
pub struct ValveState(u8);

impl ValveState {
    pub const MASK: u8 = 0b0000_1111;

    /// All valves closed
    pub const fn new() -> Self {
        Self(0)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_set(self, valve: Valve) -> bool {
        self.0 & valve.mask() != 0
    }

    /// Apply a high-level transition. Only the two bits of the
    /// transition's channel are touched.
    pub fn apply(&mut self, transition: Transition) {
        let channel = transition.channel();
        let set = transition.target().map(Valve::mask).unwrap_or(0);
        self.0 = (self.0 & !channel.mask()) | set;
    }

    pub fn with(mut self, transition: Transition) -> Self {
        self.apply(transition);
        self
    }

    pub const fn to_frame(self) -> [u8; FRAME_SIZE] {
        [self.0 & Self::MASK]
    }

    /// Decode a received frame. Returns `None` for reserved bits or a
    /// channel with inlet and outlet both open.
    pub fn from_frame(byte: u8) -> Option<Self> {
        if byte & !Self::MASK != 0 {
            return None;
        }
        let state = Self(byte);
        let contradicts = |c: Channel| state.is_set(c.inlet()) && state.is_set(c.outlet());
        if contradicts(Channel::A) || contradicts(Channel::B) {
            return None;
        }
        Some(state)
    }
}

impl fmt::Display for ValveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04b}", self.0)
    }
}

impl fmt::Binary for ValveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Binary::fmt(&self.0, f)
    }
}
