//! Styled CLI messages on stderr.
//!
//! Colors are used only when stderr is a terminal and `NO_COLOR` is not
//! set. The notifier here is what the exporter reports failures through.

use std::io::{IsTerminal, Write};

use abate_export::Notifier;

const SUCCESS: &str = "\x1b[38;2;0;245;212m";
const ERROR: &str = "\x1b[38;2;255;107;107m";
const WARNING: &str = "\x1b[38;2;255;200;87m";
const INFO: &str = "\x1b[38;2;72;202;228m";
const RESET: &str = "\x1b[0m";

/// Check if colors should be disabled based on NO_COLOR env var.
fn colors_disabled() -> bool {
    std::env::var("NO_COLOR")
        .map(|v| !v.is_empty() && v != "0" && v.to_lowercase() != "false")
        .unwrap_or(false)
}

#[derive(Debug, Clone, Copy)]
enum MessageType {
    Success,
    Error,
    Warning,
    Info,
}

impl MessageType {
    fn icon(self) -> &'static str {
        match self {
            MessageType::Success => "[OK]",
            MessageType::Error => "[ERRO]",
            MessageType::Warning => "[AVISO]",
            MessageType::Info => "[INFO]",
        }
    }

    fn color(self) -> &'static str {
        match self {
            MessageType::Success => SUCCESS,
            MessageType::Error => ERROR,
            MessageType::Warning => WARNING,
            MessageType::Info => INFO,
        }
    }
}

fn print_styled(msg_type: MessageType, message: &str) {
    let use_colors = !colors_disabled() && std::io::stderr().is_terminal();
    let mut stderr = std::io::stderr().lock();
    let _ = if use_colors {
        writeln!(stderr, "{}{} {}{}", msg_type.color(), msg_type.icon(), message, RESET)
    } else {
        writeln!(stderr, "{} {}", msg_type.icon(), message)
    };
}

pub fn print_success(message: &str) {
    print_styled(MessageType::Success, message);
}

pub fn print_error(message: &str) {
    print_styled(MessageType::Error, message);
}

pub fn print_warning(message: &str) {
    print_styled(MessageType::Warning, message);
}

pub fn print_info(message: &str) {
    print_styled(MessageType::Info, message);
}

/// Reports export failures as error lines on stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&self, message: &str) {
        print_error(message);
    }
}
