use libra_format::{Channel, Transition, Valve};

/// What the console should do with a line of operator input
#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    Refresh,
    Open(String),
    Send(Transition),
    StopAll,
    RawTransition(u8),
    SetDebug(bool),
    Status,
    Help,
    Quit,
    Nothing,
    PrintErr(&'static str),
}

pub const HELP: &str = "\
commands:
  refresh                 list serial ports
  open <port>             connect to the rig
  a-in | a-out | b-in | b-out
                          toggle a valve button
  fill <a|b>              open the inlet of a channel
  drain <a|b>             open the outlet of a channel
  stop <a|b|all>          close both valves of a channel
  state <code>            send a raw transition code (0-5)
  debug <on|off>          verbose logging
  status                  show the panel
  quit";

/// The four toggle buttons of the operator panel.
///
/// Pressing an inlet button fills that side, pressing an outlet button
/// drains it, releasing either one stops the side. At most one button per
/// side is down at a time.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Panel {
    a: Option<Valve>,
    b: Option<Valve>,
}

impl Panel {
    pub fn new() -> Self {
        Self::default()
    }

    fn side(&mut self, channel: Channel) -> &mut Option<Valve> {
        match channel {
            Channel::A => &mut self.a,
            Channel::B => &mut self.b,
        }
    }

    pub fn is_down(&self, valve: Valve) -> bool {
        let side = match valve.channel() {
            Channel::A => self.a,
            Channel::B => self.b,
        };
        side == Some(valve)
    }

    /// Click a button, returning the transition to send to the link
    pub fn click(&mut self, valve: Valve) -> Transition {
        let channel = valve.channel();
        let side = self.side(channel);
        if *side == Some(valve) {
            *side = None;
            return Transition::stop(channel);
        }
        *side = Some(valve);
        if valve == channel.inlet() {
            Transition::fill(channel)
        } else {
            Transition::drain(channel)
        }
    }

    /// Keep the buttons in line with a transition sent some other way
    pub fn follow(&mut self, transition: Transition) {
        *self.side(transition.channel()) = transition.target();
    }

    pub fn describe(&self) -> String {
        Valve::ALL
            .iter()
            .map(|&v| {
                let mark = if self.is_down(v) { "on" } else { "off" };
                format!("{}: {}", valve_name(v), mark)
            })
            .collect::<Vec<_>>()
            .join("  ")
    }
}

fn valve_name(valve: Valve) -> &'static str {
    match valve {
        Valve::AIn => "A-IN",
        Valve::AOut => "A-OUT",
        Valve::BIn => "B-IN",
        Valve::BOut => "B-OUT",
    }
}

fn parse_channel(word: Option<&str>) -> Option<Channel> {
    match word.map(str::to_ascii_lowercase).as_deref() {
        Some("a") | Some("left") => Some(Channel::A),
        Some("b") | Some("right") => Some(Channel::B),
        _ => None,
    }
}

pub struct Cmd {
    panel: Panel,
}

impl Cmd {
    pub fn new() -> Self {
        Self {
            panel: Panel::new(),
        }
    }

    pub fn panel(&self) -> &Panel {
        &self.panel
    }

    pub fn parse_line(&mut self, line: &str) -> Action {
        use Action::*;

        let mut parts = line.split_whitespace();
        let first = match parts.next() {
            Some(first) => first.to_ascii_lowercase(),
            None => return Nothing,
        };

        match first.as_str() {
            "refresh" => Refresh,
            "open" => match parts.next() {
                Some(port) => Open(port.to_owned()),
                None => PrintErr("Usage: open <port>"),
            },
            "a-in" => Send(self.panel.click(Valve::AIn)),
            "a-out" => Send(self.panel.click(Valve::AOut)),
            "b-in" => Send(self.panel.click(Valve::BIn)),
            "b-out" => Send(self.panel.click(Valve::BOut)),
            "fill" | "drain" => match parse_channel(parts.next()) {
                Some(channel) => {
                    let t = if first == "fill" {
                        Transition::fill(channel)
                    } else {
                        Transition::drain(channel)
                    };
                    self.panel.follow(t);
                    Send(t)
                }
                None => PrintErr("Usage: fill|drain <a|b>"),
            },
            "stop" => match parts.next() {
                Some("all") => {
                    self.panel = Panel::new();
                    StopAll
                }
                other => match parse_channel(other) {
                    Some(channel) => {
                        let t = Transition::stop(channel);
                        self.panel.follow(t);
                        Send(t)
                    }
                    None => PrintErr("Usage: stop <a|b|all>"),
                },
            },
            "state" => match parts.next().map(str::parse::<u8>) {
                Some(Ok(code)) => {
                    if let Ok(t) = Transition::try_from(code) {
                        self.panel.follow(t);
                    }
                    RawTransition(code)
                }
                _ => PrintErr("Usage: state <code>"),
            },
            "debug" => match parts.next() {
                Some("on") => SetDebug(true),
                Some("off") => SetDebug(false),
                _ => PrintErr("Usage: debug <on|off>"),
            },
            "status" => Status,
            "help" | "?" => Help,
            "quit" | "exit" => Quit,
            _ => PrintErr("Error parsing command"),
        }
    }
}

impl Default for Cmd {
    fn default() -> Self {
        Self::new()
    }
}
