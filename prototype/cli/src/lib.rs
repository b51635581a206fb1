pub mod cmd;
pub mod error;
pub mod link;
pub mod serial;
pub mod store;

pub use error::LinkError;
pub use link::{LinkConfig, LinkEvent, PumpLink};
pub use serial::{PortInfo, SystemPlatform};

use std::{io, sync::mpsc::Sender};

/// Start a pump link on the host's serial devices.
pub fn connect(events: Sender<LinkEvent>, config: LinkConfig) -> io::Result<PumpLink> {
    PumpLink::spawn(SystemPlatform, events, config)
}

pub mod consts {
    use std::time::Duration;

    pub const BAUD_RATE: u32 = 115_200;
    /// Time between two frames on the wire
    pub const TICK_PERIOD: Duration = Duration::from_millis(500);
}
