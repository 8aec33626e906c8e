//! Interactive console dashboard.
//!
//! Usage: `bleuscan [--adapter <index>] [--address <AA:BB:CC:DD:EE:FF>]`
//!
//! Set `RUST_LOG=bleuscan=debug` for host-level logging.

use std::sync::Arc;

use bleuscan::btle::{BtleHost, ScanConfig};
use bleuscan::picker::{Candidate, DevicePicker};
use bleuscan::{view, DeviceId, DeviceManager};
use btleplug::api::BDAddr;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

type Input = Arc<Mutex<Lines<BufReader<Stdin>>>>;

const HELP: &str = "\
commands:
  scan            pick a device and add it to the list
  connect <n>     connect to device #n
  disconnect <n>  disconnect from device #n
  remove <n>      remove device #n from the list
  dismiss         close the error message
  list            show the dashboard
  help            show this text
  quit            exit";

/// Lists candidates on stdout and reads the choice from stdin.
struct ConsolePicker {
    input: Input,
}

impl DevicePicker for ConsolePicker {
    async fn pick(&self, candidates: &[Candidate]) -> Option<usize> {
        if candidates.is_empty() {
            println!("No devices found.");
            return None;
        }

        println!("Select a device (empty line to cancel):");
        for (index, candidate) in candidates.iter().enumerate() {
            println!("  {}) {}", index + 1, candidate);
        }

        let line = self.input.lock().await.next_line().await.ok().flatten()?;
        match line.trim().parse::<usize>() {
            Ok(n) if (1..=candidates.len()).contains(&n) => Some(n - 1),
            _ => None,
        }
    }
}

enum Command {
    Scan,
    Connect(usize),
    Disconnect(usize),
    Remove(usize),
    Dismiss,
    List,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    let mut words = line.split_whitespace();
    let command = words.next()?;
    let mut index = || words.next()?.parse::<usize>().ok();

    Some(match command {
        "scan" | "add" => Command::Scan,
        "connect" => Command::Connect(index()?),
        "disconnect" => Command::Disconnect(index()?),
        "remove" | "rm" => Command::Remove(index()?),
        "dismiss" => Command::Dismiss,
        "list" | "ls" => Command::List,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        _ => return None,
    })
}

/// Build the scan config from command line options.
fn scan_config(mut args: impl Iterator<Item = String>) -> Result<ScanConfig, String> {
    let mut config = ScanConfig::default();

    while let Some(arg) = args.next() {
        let value = args
            .next()
            .ok_or_else(|| format!("missing value for {}", arg))?;
        match arg.as_str() {
            "--adapter" => {
                let index = value
                    .parse::<usize>()
                    .map_err(|_| format!("invalid adapter index: {}", value))?;
                config = config.adapter_index(index);
            }
            "--address" => {
                let wanted = value
                    .parse::<BDAddr>()
                    .map_err(|e| format!("invalid address {}: {}", value, e))?;
                config = config.filter_by_address(move |addr| addr == wanted);
            }
            _ => return Err(format!("unknown option: {}", arg)),
        }
    }

    Ok(config)
}

fn device_at(manager: &DeviceManager<BtleHost<ConsolePicker>>, n: usize) -> Option<DeviceId> {
    let entry = manager.state().devices().get(n.checked_sub(1)?)?;
    Some(entry.id())
}

#[tokio::main]
async fn main() {
    pretty_env_logger::init();

    let config = match scan_config(std::env::args().skip(1)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };

    let input: Input = Arc::new(Mutex::new(BufReader::new(tokio::io::stdin()).lines()));
    let picker = ConsolePicker {
        input: input.clone(),
    };

    let host = BtleHost::new(config, picker).await;
    let mut manager = DeviceManager::new(host).await;

    print!("{}", view::render(manager.state()));
    if !manager.state().is_supported() {
        return;
    }
    println!("{}", HELP);

    loop {
        let line = tokio::select! {
            line = async { input.lock().await.next_line().await } => line,
            Some(event) = manager.next_event() => {
                log::debug!("{:?}", event);
                print!("{}", view::render(manager.state()));
                continue;
            }
        };

        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                log::error!("Failed to read input: {}", e);
                break;
            }
        };

        let Some(command) = parse_command(&line) else {
            if !line.trim().is_empty() {
                println!("Unknown command. Type `help` for a list.");
            }
            continue;
        };

        match command {
            Command::Scan => {
                println!("Scanning…");
                manager.scan().await;
            }
            Command::Connect(n) => match device_at(&manager, n) {
                Some(id) if manager.state().is_connected(&id) => {
                    println!("{} is already connected", id);
                }
                Some(id) => {
                    println!("Connecting to {}…", id);
                    manager.connect(&id).await;
                }
                None => println!("No device #{}", n),
            },
            Command::Disconnect(n) => match device_at(&manager, n) {
                Some(id) => manager.disconnect(&id).await,
                None => println!("No device #{}", n),
            },
            Command::Remove(n) => match device_at(&manager, n) {
                Some(id) => {
                    manager.remove(&id);
                }
                None => println!("No device #{}", n),
            },
            Command::Dismiss => manager.dismiss_error(),
            Command::List => {}
            Command::Help => {
                println!("{}", HELP);
                continue;
            }
            Command::Quit => break,
        }

        manager.process_pending_events();
        print!("{}", view::render(manager.state()));
    }

    // Leave connected devices the way we found them.
    let connected = manager
        .state()
        .devices()
        .iter()
        .filter(|entry| entry.is_connected())
        .map(|entry| entry.id())
        .collect::<Vec<_>>();
    for id in connected {
        manager.disconnect(&id).await;
    }
}
