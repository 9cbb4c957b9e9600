//! Terminal summaries for the command line tool

use crate::patch::PatchSummary;
use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Print a patch summary as aligned, colored key/value lines
pub fn print_summary(summary: &PatchSummary, choice: ColorChoice) -> io::Result<()> {
    let mut stdout = StandardStream::stdout(choice);
    write_summary(&mut stdout, summary)
}

/// Print a patch summary as JSON
pub fn print_summary_json(summary: &PatchSummary) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, summary)?;
    writeln!(out)
}

/// Write a patch summary to any color-capable writer
pub fn write_summary<W: WriteColor>(out: &mut W, summary: &PatchSummary) -> io::Result<()> {
    print_field(out, "Output size", &format_size(summary.new_size))?;
    print_field(out, "Patch size", &format_size(summary.patch_size))?;
    print_field(out, "Records", &summary.records.to_string())?;
    print_field(
        out,
        "Copied",
        &format!(
            "{} ({:.1}%)",
            format_size(summary.copy_bytes),
            summary.copy_ratio() * 100.0
        ),
    )?;
    print_field(out, "Inserted", &format_size(summary.extra_bytes))?;
    if summary.records > 0 {
        print_field(
            out,
            "Seek range",
            &format!("{} .. {}", summary.min_seek, summary.max_seek),
        )?;
    }
    if summary.trailing_bytes > 0 {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
        writeln!(
            out,
            "warning: {} trailing bytes after last record",
            summary.trailing_bytes
        )?;
        out.reset()?;
    }
    Ok(())
}

/// Print a one-line result, e.g. after writing a patch
pub fn print_done(label: &str, detail: &str, choice: ColorChoice) -> io::Result<()> {
    let mut stdout = StandardStream::stdout(choice);
    stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true))?;
    write!(stdout, "{}", label)?;
    stdout.reset()?;
    writeln!(stdout, " {}", detail)
}

fn print_field<W: WriteColor>(out: &mut W, name: &str, value: &str) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)))?;
    write!(out, "{:<12}", name)?;
    out.reset()?;
    writeln!(out, "{}", value)
}

/// Human-readable byte count
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64;
    let mut unit = "B";
    for next in UNITS {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }
    format!("{:.1} {} ({} bytes)", value, unit, bytes)
}
