#[cfg(not(feature = "cli"))]
compile_error!("Please enable 'cli' feature to build CLI application");

use anyhow::Context;
use clap::{App, Arg};
use libra::cmd::{Action, Cmd, HELP};
use libra::link::{LinkConfig, LinkEvent, PumpLink};
use libra::serial::Platform;
use libra::store::{FrameSink, FrameStore};
use libra::SystemPlatform;
use libra_format::Transition;
use std::io::{self, BufRead, Write};
use std::sync::mpsc;
use std::thread;

fn prompt() {
    print!("--> ");
    let _ = io::stdout().flush();
}

fn run(link: PumpLink) {
    let stdin = io::stdin();
    let mut cmd = Cmd::new();
    prompt();
    for line in stdin.lock().lines().filter_map(|r| r.ok()) {
        match cmd.parse_line(&line) {
            Action::Refresh => link.refresh(),
            Action::Open(port) => link.open(port),
            Action::Send(t) => link.update_state(t),
            Action::StopAll => {
                link.update_state(Transition::LeftStop);
                link.update_state(Transition::RightStop);
            }
            Action::RawTransition(code) => link.update_state_raw(code),
            Action::SetDebug(enabled) => link.set_debug(enabled),
            Action::Status => println!("{}", cmd.panel().describe()),
            Action::Help => println!("{}", HELP),
            Action::Quit => break,
            Action::Nothing => {}
            Action::PrintErr(e) => eprintln!("{}", e),
        }
        prompt();
    }
    link.stop();
}

fn main() -> anyhow::Result<()> {
    let matches = App::new("LIBRA pump console")
        .version("0.1")
        .arg(
            Arg::with_name("PORT")
                .index(1)
                .takes_value(true)
                .help("The serial port the rig is attached to"),
        )
        .arg(
            Arg::with_name("DEBUG")
                .short("d")
                .long("debug")
                .help("Verbose debug output"),
        )
        .arg(
            Arg::with_name("QUIET")
                .short("q")
                .long("quiet")
                .conflicts_with("DEBUG")
                .help("No log output at all"),
        )
        .arg(
            Arg::with_name("LIST")
                .short("l")
                .long("list")
                .help("List available serial ports and exit"),
        )
        .arg(
            Arg::with_name("OUT_FILE")
                .short("o")
                .long("outfile")
                .required(false)
                .takes_value(true)
                .help("Log every transmitted frame to this CSV file"),
        )
        .get_matches();

    let debug = matches.is_present("DEBUG");
    let mut logger = env_logger::Builder::new();
    if matches.is_present("QUIET") {
        logger.filter_level(log::LevelFilter::Off);
    } else {
        // The link gates its own debug output, so it can be switched at runtime
        logger
            .filter_level(log::LevelFilter::Info)
            .filter_module("libra", log::LevelFilter::Debug);
    }
    logger.parse_default_env().init();

    if matches.is_present("LIST") {
        return print_available_ports();
    }

    let frame_log: Option<Box<dyn FrameSink>> = match matches.value_of("OUT_FILE") {
        Some(path) => {
            let store =
                FrameStore::create(path).with_context(|| format!("Could not create {}", path))?;
            Some(Box::new(store))
        }
        None => None,
    };

    let (tx, rx) = mpsc::channel::<LinkEvent>();
    let config = LinkConfig {
        debug,
        frame_log,
        ..LinkConfig::default()
    };
    let link = libra::connect(tx, config).context("Could not start pump link")?;

    let _events_thread = thread::spawn(move || {
        for event in rx.into_iter() {
            match event {
                LinkEvent::Available(ports) => {
                    println!();
                    println!("Available ports:");
                    for port in ports {
                        println!("\t - {}", port);
                    }
                    prompt();
                }
            }
        }
    });

    match matches.value_of("PORT") {
        Some(port_name) => link.open(port_name),
        None => {
            println!("No port given. Use 'refresh' to list ports and 'open <port>' to connect.");
            link.refresh();
        }
    }

    run(link);
    Ok(())
}

fn print_available_ports() -> anyhow::Result<()> {
    let ports = SystemPlatform
        .available_ports()
        .context("Could not enumerate serial ports")?;
    if ports.is_empty() {
        println!("No serial devices were found");
    }
    for port in ports {
        let manufacturer = port.manufacturer.unwrap_or_default();
        let description = port.description.unwrap_or_default();
        println!(
            "\t - {} ({}; Manufacturer: {}; Serial number: {})",
            port.name,
            description,
            manufacturer,
            port.serial_number.unwrap_or_default(),
        );
    }
    Ok(())
}
