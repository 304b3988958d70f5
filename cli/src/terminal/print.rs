use colored::*;
use tracing::info;

use wolagent_core::progress::ProgressSink;

use crate::terminal::colors;

pub const TOTAL_WIDTH: usize = 64;

pub fn print(msg: &str) {
    info!(target: "wolagent::print", "{msg}");
}

pub fn header(msg: &str) {
    let formatted: String = format!("⟦ {} ⟧", msg);
    let msg_len: usize = formatted.chars().count();

    let dash_count: usize = TOTAL_WIDTH.saturating_sub(msg_len);
    let left: usize = dash_count / 2;
    let right: usize = dash_count - left;

    let line: ColoredString = format!(
        "{}{}{}",
        "─".repeat(left),
        formatted.to_uppercase().bright_green(),
        "─".repeat(right)
    )
    .bright_black();

    print(&format!("{}", line));
}

pub fn fat_separator() {
    let sep: ColoredString = "═".repeat(TOTAL_WIDTH).bright_black();
    print(&format!("{}", sep));
}

pub fn aligned_line(key: &str, value: impl AsRef<str>, key_width: usize) {
    let dots: String = ".".repeat((key_width + 1).saturating_sub(key.len()));
    let colon: String = format!(
        "{}{}",
        dots.color(colors::SEPARATOR),
        ":".color(colors::SEPARATOR)
    );
    let value: ColoredString = value.as_ref().color(colors::ACCENT);
    print_status(format!("{}{} {}", key.color(colors::PRIMARY), colon, value));
}

pub fn print_status<T: AsRef<str>>(msg: T) {
    let prefix: ColoredString = ">".color(colors::SEPARATOR);
    let message: String = format!("{} {}", prefix, msg.as_ref().color(colors::TEXT_DEFAULT));
    print(&message);
}

/// Launch progress rendered as status lines.
pub struct TerminalProgress;

impl ProgressSink for TerminalProgress {
    fn report(&self, line: &str) {
        print_status(line);
    }
}
