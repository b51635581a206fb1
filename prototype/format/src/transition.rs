#[cfg(feature = "defmt")]
use defmt::Format;

use crate::{Channel, Valve};

/// High-level valve commands issued by the operator.
///
/// `Left*` acts on channel A, `Right*` on channel B. The numeric codes
/// are stable; they are what a front end sends when it only has a raw
/// value at hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(Format))]
#[repr(u8)]
pub enum Transition {
    LeftStop = 0,
    RightStop = 1,
    LeftFill = 2,
    RightFill = 3,
    LeftDrain = 4,
    RightDrain = 5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown pump state: {0}")]
pub struct UnknownTransition(pub u8);

impl Transition {
    pub const fn channel(self) -> Channel {
        use Transition::*;
        match self {
            LeftStop | LeftFill | LeftDrain => Channel::A,
            RightStop | RightFill | RightDrain => Channel::B,
        }
    }

    /// The valve left open on the channel after this transition, if any
    pub const fn target(self) -> Option<Valve> {
        use Transition::*;
        match self {
            LeftStop | RightStop => None,
            LeftFill | RightFill => Some(self.channel().inlet()),
            LeftDrain | RightDrain => Some(self.channel().outlet()),
        }
    }

    pub const fn stop(channel: Channel) -> Self {
        match channel {
            Channel::A => Transition::LeftStop,
            Channel::B => Transition::RightStop,
        }
    }

    pub const fn fill(channel: Channel) -> Self {
        match channel {
            Channel::A => Transition::LeftFill,
            Channel::B => Transition::RightFill,
        }
    }

    pub const fn drain(channel: Channel) -> Self {
        match channel {
            Channel::A => Transition::LeftDrain,
            Channel::B => Transition::RightDrain,
        }
    }

    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Transition {
    type Error = UnknownTransition;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        use Transition::*;
        Ok(match code {
            0 => LeftStop,
            1 => RightStop,
            2 => LeftFill,
            3 => RightFill,
            4 => LeftDrain,
            5 => RightDrain,
            _ => return Err(UnknownTransition(code)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_declaration_order() {
        for code in 0..6u8 {
            let t = Transition::try_from(code).unwrap();
            assert_eq!(t.code(), code);
        }
    }

    #[test]
    fn rejects_unknown_codes() {
        assert_eq!(Transition::try_from(6), Err(UnknownTransition(6)));
        assert_eq!(Transition::try_from(99), Err(UnknownTransition(99)));
    }

    #[test]
    fn constructors_pick_the_right_side() {
        assert_eq!(Transition::fill(Channel::A), Transition::LeftFill);
        assert_eq!(Transition::drain(Channel::B), Transition::RightDrain);
        assert_eq!(Transition::stop(Channel::B).target(), None);
        assert_eq!(Transition::RightFill.target(), Some(Valve::BIn));
        assert_eq!(Transition::LeftDrain.target(), Some(Valve::AOut));
    }
}
