//! Serial console adapter.
//!
//! Line-oriented commands on UART / USB-CDC, standing in for the Zigbee
//! coordinator on a bench board.  Direction and tilt commands are turned
//! into window-covering [`ZclMessage`]s so they travel the same dispatch
//! path as radio traffic; the rest act on the controller directly.
//!
//! ```text
//! open | close | stop | tilt <0-255>   → ZclMessage → CMD_CHANNEL
//! connected | calibrate <n> | speed <ms> | config | help
//! ```

use std::io::{BufRead, ErrorKind};

use log::{info, warn};

use crate::app::commands::ShadeCommand;
use crate::app::ports::Clock;
use crate::protocol::ZclMessage;

/// Back-off between reads when the UART has nothing for us.
const READ_RETRY_MS: u32 = 10;

pub const HELP: &str = "commands: open | close | stop | tilt <0-255> | connected | \
                        calibrate <0-100> | speed <ms per %> | config | help";

/// One parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Forward to the protocol dispatch path.
    Message(ZclMessage),
    /// Simulate the link coming up.
    Connected,
    /// Declare the current position without moving.
    Calibrate(u8),
    /// Set the motor time constant.
    Speed(u32),
    /// Print the active configuration.
    ShowConfig,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleError {
    Empty,
    UnknownCommand(String),
    MissingArgument(&'static str),
    InvalidArgument(String),
}

impl core::fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty line"),
            Self::UnknownCommand(c) => write!(f, "unknown command '{}'", c),
            Self::MissingArgument(c) => write!(f, "'{}' needs an argument", c),
            Self::InvalidArgument(a) => write!(f, "invalid argument '{}'", a),
        }
    }
}

/// Parse one line of console input.
pub fn parse_line(line: &str) -> Result<ConsoleCommand, ConsoleError> {
    let mut parts = line.split_whitespace();
    let command = parts.next().ok_or(ConsoleError::Empty)?;
    let arg = parts.next();

    let wc = |c: ShadeCommand| -> Result<ConsoleCommand, ConsoleError> {
        Ok(ConsoleCommand::Message(ZclMessage::window_covering(c)))
    };
    match command {
        "open" => wc(ShadeCommand::Open),
        "close" => wc(ShadeCommand::Close),
        "stop" => wc(ShadeCommand::Stop),
        "tilt" => wc(ShadeCommand::GoToTiltPercentage(parse_arg("tilt", arg)?)),
        "connected" => Ok(ConsoleCommand::Connected),
        "calibrate" => Ok(ConsoleCommand::Calibrate(parse_arg("calibrate", arg)?)),
        "speed" => Ok(ConsoleCommand::Speed(parse_arg("speed", arg)?)),
        "config" => Ok(ConsoleCommand::ShowConfig),
        "help" => Ok(ConsoleCommand::Help),
        other => Err(ConsoleError::UnknownCommand(other.to_string())),
    }
}

fn parse_arg<T: core::str::FromStr>(command: &'static str, arg: Option<&str>) -> Result<T, ConsoleError> {
    let arg = arg.ok_or(ConsoleError::MissingArgument(command))?;
    arg.parse()
        .map_err(|_| ConsoleError::InvalidArgument(arg.to_string()))
}

/// Read lines from `reader` until EOF, handing each parsed command to
/// `on_command`.  Bad lines are logged and skipped.
pub fn run<R: BufRead>(mut reader: R, clock: &dyn Clock, mut on_command: impl FnMut(ConsoleCommand)) {
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => return,
            Ok(_) => {}
            Err(e) => match e.kind() {
                ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted => {
                    clock.sleep_ms(READ_RETRY_MS);
                    continue;
                }
                _ => {
                    warn!("Console: read failed: {}", e);
                    clock.sleep_ms(READ_RETRY_MS);
                    continue;
                }
            },
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        info!("Command: {}", trimmed);
        match parse_line(trimmed) {
            Ok(cmd) => on_command(cmd),
            Err(e) => warn!("Console: {}. {}", e, HELP),
        }
    }
}
