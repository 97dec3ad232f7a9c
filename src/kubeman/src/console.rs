//! Terminal output helpers shared by the runner, the poller and the manager.

use std::io::Write;

use colored::Colorize;

pub const WIDTH: usize = 79;

pub fn hline(c: char) {
    println!("{}", rule(c, WIDTH));
}

pub fn rule(c: char, n: usize) -> String {
    std::iter::repeat(c).take(n).collect()
}

/// single-line form of a banner, as stored in history
pub fn banner_line(msg: &str) -> String {
    format!("# ---- {} ----", msg.trim())
}

pub fn banner(msg: &str) {
    let rule = rule('#', WIDTH);
    println!();
    println!("{}", rule);
    println!("# {}", msg.trim());
    println!("{}", rule);
    println!();
}

pub fn info(msg: &str) {
    println!("{}", msg.blue());
}

pub fn ok(msg: &str) {
    println!("{}", msg.green());
}

pub fn error(msg: &str) {
    println!("{}", msg.red().bold());
}

/// write `text` without a newline and flush it out
pub fn write_inline<W: Write>(out: &mut W, text: &str) -> std::io::Result<()> {
    out.write_all(text.as_bytes())?;
    out.flush()
}

/// text that stays on the current line, e.g. a prefix for progress dots
pub fn inline(text: &str) {
    let _ = write_inline(&mut std::io::stdout(), text);
}

/// one progress dot, flushed so it shows while the caller sleeps
pub fn progress() {
    inline(".");
}
