//! Interactive command-line client for driving emulator sessions
//!
//! Detects the installed emulator backends, lets the operator pick a
//! session, then offers a small read/send menu against it. `--playback`
//! runs the same surface against a scripted host so the client can be
//! exercised without an emulator installed.

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, bail};

use tnpilot::config::SessionConfig;
use tnpilot::host::{self, AutomationHost, TerminalKind};
use tnpilot::locator;
use tnpilot::scripted::ScriptedHost;
use tnpilot::session::TerminalSession;
use tnpilot::TerminalResult;

fn print_usage() {
    println!("Usage: tnpilot [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -t, --type <KIND>       Terminal type: extra, his or netmanage");
    println!("  -s, --session <SPEC>    Session index (1-based) or name");
    println!("  -c, --command <TEXT>    Send one command and print the screen");
    println!("      --config <PATH>     Load configuration from a JSON file");
    println!("  -l, --list              List available sessions and exit");
    println!("      --status            Print the system status and exit");
    println!("      --playback          Drive a built-in scripted host");
    println!("  -h, --help              Show this help");
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let mut kind_arg: Option<String> = None;
    let mut session_arg: Option<String> = None;
    let mut command_arg: Option<String> = None;
    let mut config_arg: Option<String> = None;
    let mut list_only = false;
    let mut status_only = false;
    let mut playback = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--type" | "-t" => {
                if i + 1 < args.len() {
                    kind_arg = Some(args[i + 1].clone());
                    i += 1;
                } else {
                    eprintln!("Error: --type requires a value");
                    std::process::exit(1);
                }
            }
            "--session" | "-s" => {
                if i + 1 < args.len() {
                    session_arg = Some(args[i + 1].clone());
                    i += 1;
                } else {
                    eprintln!("Error: --session requires a value");
                    std::process::exit(1);
                }
            }
            "--command" | "-c" => {
                if i + 1 < args.len() {
                    command_arg = Some(args[i + 1].clone());
                    i += 1;
                } else {
                    eprintln!("Error: --command requires a value");
                    std::process::exit(1);
                }
            }
            "--config" => {
                if i + 1 < args.len() {
                    config_arg = Some(args[i + 1].clone());
                    i += 1;
                } else {
                    eprintln!("Error: --config requires a value");
                    std::process::exit(1);
                }
            }
            "--list" | "-l" => list_only = true,
            "--status" => status_only = true,
            "--playback" => playback = true,
            "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            other => {
                eprintln!("Error: unknown option {other}");
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let config = load_config(config_arg.as_deref())?;

    let host: Box<dyn AutomationHost>;
    let kind: TerminalKind;
    if playback {
        host = playback_host().boxed();
        kind = TerminalKind::Extra;
    } else {
        kind = match kind_arg.as_deref() {
            Some(value) => value.parse::<TerminalKind>().map_err(|e| anyhow!(e))?,
            None => choose_kind()?,
        };
        host = host::create(kind).map_err(|e| anyhow!("{e}"))?;
    }

    if list_only {
        match locator::list_sessions(host.as_ref()) {
            Ok(sessions) => println!("{}", serde_json::to_string_pretty(&sessions)?),
            Err(message) => eprintln!("{message}"),
        }
        return Ok(());
    }

    let spec = match session_arg {
        Some(spec) => spec,
        // a status query does not care which session it rides on
        None if status_only => "1".to_string(),
        None => select_session(host.as_ref())?,
    };

    let mut terminal = TerminalSession::with_host(host, kind, &spec, config)
        .map_err(|e| anyhow!("{e}"))?;

    if status_only {
        match terminal.system_status() {
            Ok(status) => println!("{}", serde_json::to_string_pretty(&status)?),
            Err(message) => eprintln!("{message}"),
        }
        return Ok(());
    }

    if let Some(command) = command_arg {
        terminal
            .scope(|term| {
                let formatted = term.send_command(&command)?;
                println!("Sent: {formatted}");
                print_screen(term)
            })
            .map_err(|e| anyhow!("{e}"))?;
        return Ok(());
    }

    terminal
        .scope(|term| {
            match term.system_status() {
                Ok(status) => {
                    if let Ok(rendered) = serde_json::to_string_pretty(&status) {
                        println!("System status: {rendered}");
                    }
                }
                Err(message) => println!("System status unavailable: {message}"),
            }
            menu_loop(term)
        })
        .map_err(|e| anyhow!("{e}"))?;

    Ok(())
}

fn load_config(path: Option<&str>) -> anyhow::Result<SessionConfig> {
    match path {
        Some(path) => SessionConfig::load(Path::new(path))
            .map_err(|e| anyhow!("failed to load config {path}: {e}")),
        None => {
            let default_path = SessionConfig::default_path();
            if default_path.is_file() {
                match SessionConfig::load(&default_path) {
                    Ok(config) => Ok(config),
                    Err(e) => {
                        log::warn!(
                            "ignoring unreadable config {}: {e}",
                            default_path.display()
                        );
                        Ok(SessionConfig::default())
                    }
                }
            } else {
                Ok(SessionConfig::default())
            }
        }
    }
}

// Built-in script: a plausible sign-on screen behind a two-session host.
fn playback_host() -> ScriptedHost {
    let host = ScriptedHost::new("Playback 1.0");
    let session = host.add_session("PLAYBACK", true);
    host.add_session("SPARE", false);

    let mut screen = String::new();
    screen.push_str(&format!("{:<80}", ""));
    screen.push_str(&format!("{:^80}", "WELCOME TO THE PLAYBACK SYSTEM"));
    screen.push_str(&format!("{:<80}", ""));
    screen.push_str(&format!("{:<80}", " SIGN ON"));
    screen.push_str(&format!("{:<80}", "   USER  . . . . . . . . ._________"));
    screen.push_str(&format!("{:<80}", "   PASSWORD. . . . . . . ._________"));
    session.set_contents(&screen);
    session.push_statuses(&[5, 0]);
    host
}

fn choose_kind() -> anyhow::Result<TerminalKind> {
    println!("Detecting available terminal types...");
    let available = TerminalKind::detect_available();
    if available.is_empty() {
        bail!("No supported terminal emulation software found");
    }

    println!("\nAvailable terminal types:");
    for (i, kind) in available.iter().enumerate() {
        println!("{}. {}", i + 1, kind.prog_id());
    }

    loop {
        let choice = prompt("\nSelect terminal type (number): ")?;
        match choice.trim().parse::<usize>() {
            Ok(index) if index >= 1 && index <= available.len() => {
                return Ok(available[index - 1]);
            }
            _ => println!("Please enter a valid number."),
        }
    }
}

// Interactive selection; on enumeration failure the first session wins.
fn select_session(host: &dyn AutomationHost) -> anyhow::Result<String> {
    let sessions = match locator::list_sessions(host) {
        Ok(sessions) => sessions,
        Err(message) => {
            eprintln!("Error listing sessions: {message}");
            return Ok("1".to_string());
        }
    };

    println!("\nAvailable Sessions:");
    println!("------------------");
    for session in &sessions {
        let status = if session.connected {
            "Connected"
        } else {
            "Disconnected"
        };
        println!("{}. {} ({status})", session.index, session.name);
    }

    loop {
        let choice = prompt("\nSelect session (enter number): ")?;
        match choice.trim().parse::<usize>() {
            Ok(index) if index >= 1 && index <= sessions.len() => {
                return Ok(index.to_string());
            }
            Ok(_) => println!("Invalid session number. Please try again."),
            Err(_) => println!("Please enter a valid number."),
        }
    }
}

fn menu_loop(terminal: &mut TerminalSession) -> TerminalResult<()> {
    loop {
        println!("\nOptions:");
        println!("1. Read screen content");
        println!("2. Send command");
        println!("3. Exit");

        let choice = match prompt("\nSelect option (1-3): ") {
            Ok(choice) => choice,
            Err(_) => break,
        };

        match choice.trim() {
            "1" => {
                if let Err(e) = print_screen(terminal) {
                    println!("Error: {e}");
                }
            }
            "2" => {
                let command = match prompt("Enter command: ") {
                    Ok(command) => command,
                    Err(_) => break,
                };
                match terminal.send_command(command.trim_end()) {
                    Ok(formatted) => {
                        println!("Sent: {formatted}");
                        // give the remote application a moment to repaint
                        thread::sleep(Duration::from_secs(1));
                        if let Err(e) = print_screen(terminal) {
                            println!("Error: {e}");
                        }
                    }
                    Err(e) => println!("Error: {e}"),
                }
            }
            "3" => {
                println!("Exiting...");
                break;
            }
            _ => println!("Invalid option. Please try again."),
        }
    }
    Ok(())
}

fn print_screen(terminal: &mut TerminalSession) -> TerminalResult<()> {
    let content = terminal.read_screen(true)?;
    println!("{}", "-".repeat(80));
    println!("{}", content.into_text());
    println!("{}", "-".repeat(80));
    Ok(())
}

fn prompt(text: &str) -> io::Result<String> {
    print!("{text}");
    io::stdout().flush()?;
    let mut line = String::new();
    let read = io::stdin().lock().read_line(&mut line)?;
    if read == 0 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed"));
    }
    Ok(line)
}
