use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

static JSON_MODE: AtomicBool = AtomicBool::new(false);

pub fn init(json: bool) {
    JSON_MODE.store(json, Ordering::Relaxed);
}

pub fn is_json() -> bool {
    JSON_MODE.load(Ordering::Relaxed)
}

/// Print a command result. JSON mode emits one compact document per line.
pub fn print<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let s = if is_json() {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{s}");
    Ok(())
}

/// One `name: detail` status line, colored by outcome on a terminal.
pub fn status_line(name: &str, ok: bool, detail: &str) -> io::Result<()> {
    let mut out = StandardStream::stdout(ColorChoice::Auto);
    out.set_color(ColorSpec::new().set_fg(Some(if ok { Color::Green } else { Color::Red })).set_bold(true))?;
    write!(out, "{}", if ok { "ok  " } else { "FAIL" })?;
    out.reset()?;
    writeln!(out, " {name}: {detail}")
}
