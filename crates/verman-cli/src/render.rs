use std::io::IsTerminal;

use anstyle::{AnsiColor, Effects, Style};
use verman_core::Command;
use verman_doctor::{Diagnosis, FixReport};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum OutputStyle {
    Plain,
    Rich,
}

pub(crate) fn current_output_style() -> OutputStyle {
    if std::env::var_os("NO_COLOR").is_some() || !std::io::stdout().is_terminal() {
        OutputStyle::Plain
    } else {
        OutputStyle::Rich
    }
}

pub(crate) fn render_status_line(style: OutputStyle, status: &str, message: &str) -> String {
    match style {
        OutputStyle::Plain => format!("{status} {message}"),
        OutputStyle::Rich => format!("{} {message}", colorize(status_style(status), status)),
    }
}

pub(crate) fn format_command_lines(commands: &[Command], style: OutputStyle) -> Vec<String> {
    if commands.is_empty() {
        return vec!["no commands registered".to_string()];
    }

    let name_width = commands
        .iter()
        .map(|command| command.name.len())
        .max()
        .unwrap_or_default();
    let version_width = commands
        .iter()
        .map(|command| command.version.len())
        .max()
        .unwrap_or_default();

    commands
        .iter()
        .map(|command| {
            let marker = if command.activated { "*" } else { " " };
            let line = format!(
                "{marker} {:<name_width$}  {:<version_width$}  {}",
                command.name, command.version, command.location
            );
            match (style, command.activated) {
                (OutputStyle::Rich, true) => colorize(active_style(), &line),
                _ => line,
            }
        })
        .collect()
}

pub(crate) fn format_diagnosis_lines(diagnosis: &Diagnosis, style: OutputStyle) -> Vec<String> {
    let mut lines = Vec::new();
    for command in &diagnosis.available {
        lines.push(render_status_line(
            style,
            "ok",
            &format!("{} {}", command.identity(), command.location),
        ));
    }
    for command in &diagnosis.unavailable {
        lines.push(render_status_line(
            style,
            "broken",
            &format!(
                "{} {} (missing or not executable)",
                command.identity(),
                command.location
            ),
        ));
    }
    if lines.is_empty() {
        lines.push(render_status_line(style, "ok", "no commands registered"));
    }
    lines
}

pub(crate) fn format_fix_report_lines(report: &FixReport, style: OutputStyle) -> Vec<String> {
    let verb = if report.dry_run { "would" } else { "did" };
    let mut lines = Vec::new();
    if let Some(backup) = &report.backup_path {
        lines.push(render_status_line(
            style,
            "backup",
            &format!("{verb} copy managed root to {backup}"),
        ));
    }
    for command in &report.removed {
        lines.push(render_status_line(
            style,
            "remove",
            &format!("{verb} remove {}", command.identity()),
        ));
    }
    for command in &report.restored {
        let suffix = if command.activated { " (active)" } else { "" };
        lines.push(render_status_line(
            style,
            "restore",
            &format!("{verb} re-register {}{suffix}", command.identity()),
        ));
    }
    for failure in &report.failures {
        lines.push(render_status_line(
            style,
            "failed",
            &format!(
                "{} {}@{}: {}",
                failure.action.as_str(),
                failure.name,
                failure.version,
                failure.error
            ),
        ));
    }
    lines
}

fn status_style(status: &str) -> Style {
    let color = match status {
        "ok" | "restore" => AnsiColor::BrightGreen,
        "broken" | "failed" => AnsiColor::BrightRed,
        "remove" => AnsiColor::BrightYellow,
        _ => AnsiColor::BrightBlue,
    };
    Style::new()
        .fg_color(Some(color.into()))
        .effects(Effects::BOLD)
}

fn active_style() -> Style {
    Style::new().fg_color(Some(AnsiColor::BrightGreen.into()))
}

fn colorize(style: Style, text: &str) -> String {
    format!("{}{}{}", style.render(), text, style.render_reset())
}
