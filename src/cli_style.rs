use clap::builder::styling::{AnsiColor, Color as ClapColor, Style};
use clap::builder::Styles;
use crossterm::style::{Attribute, Color, Stylize};
use std::io::{self, Write};
use unicode_width::UnicodeWidthStr;

pub fn get_styles() -> Styles {
    let accent = |color: AnsiColor| Style::new().bold().fg_color(Some(ClapColor::Ansi(color)));
    Styles::styled()
        .usage(accent(AnsiColor::Cyan).underline())
        .header(accent(AnsiColor::Cyan).underline())
        .literal(accent(AnsiColor::Green))
        .invalid(accent(AnsiColor::Red))
        .error(accent(AnsiColor::Red))
        .valid(accent(AnsiColor::Green))
        .placeholder(Style::new().fg_color(Some(ClapColor::Ansi(AnsiColor::BrightBlack))))
}

mod palette {
    use crossterm::style::Color;

    const fn rgb(r: u8, g: u8, b: u8) -> Color {
        Color::Rgb { r, g, b }
    }

    pub const ACCENT: Color = rgb(0, 255, 255);
    pub const FRAME: Color = rgb(180, 100, 255);
    pub const HIGHLIGHT: Color = rgb(255, 0, 255);
    pub const OK: Color = rgb(0, 255, 136);
    pub const WARN: Color = rgb(255, 165, 0);
    pub const FAIL: Color = rgb(255, 85, 85);
    pub const NOTE: Color = rgb(100, 149, 237);
    pub const MUTED: Color = rgb(128, 128, 128);
    pub const TEXT: Color = rgb(255, 255, 255);
}

use palette::*;

const SECTION_WIDTH: usize = 60;
const WELCOME_WIDTH: usize = 64;

/// `content` padded with spaces to `width` display columns.
fn pad(content: &str, visible: usize, width: usize) -> String {
    format!("{}{}", content, " ".repeat(width.saturating_sub(visible)))
}

/// Left fill, title, right fill for a header of `width` columns.
fn header_fill(title: &str, width: usize) -> (usize, usize) {
    let used = title.width() + 2;
    let left = width.saturating_sub(used) / 2;
    (left, width.saturating_sub(used + left))
}

fn print_banner() {
    let banner = [
        " █████╗ ████████╗██████╗ ██╗███████╗",
        "██╔══██╗╚══██╔══╝██╔══██╗██║██╔════╝",
        "███████║   ██║   ██████╔╝██║███████╗",
        "██╔══██║   ██║   ██╔══██╗██║╚════██║",
        "██║  ██║   ██║   ██║  ██║██║███████║",
        "╚═╝  ╚═╝   ╚═╝   ╚═╝  ╚═╝╚═╝╚══════╝",
    ];
    let shades = [ACCENT, ACCENT, FRAME, FRAME, HIGHLIGHT, HIGHLIGHT];

    println!();
    for (line, color) in banner.iter().zip(shades) {
        println!("    {}", line.with(color).bold());
    }
    println!("{}", "  ────────────  MUSIC QUERY CLI  ────────────".with(MUTED));
    println!();
}

fn print_status(glyph: &str, color: Color, message: &str) {
    println!(" {} {}", glyph.with(color).bold(), message.with(color));
}

pub fn print_success(message: &str) {
    print_status("✓", OK, message);
}

pub fn print_error(message: &str) {
    print_status("✗", FAIL, message);
}

pub fn print_warning(message: &str) {
    print_status("⚠", WARN, message);
}

pub fn print_info(message: &str) {
    print_status("ℹ", NOTE, message);
}

pub fn print_section_header(title: &str) {
    let (left, right) = header_fill(title, SECTION_WIDTH);
    println!();
    println!(
        "{}{} {} {}{}",
        "╭".with(ACCENT),
        "─".repeat(left).with(ACCENT),
        title.with(ACCENT).bold().attribute(Attribute::Italic),
        "─".repeat(right).with(ACCENT),
        "╮".with(ACCENT)
    );
}

pub fn print_section_footer() {
    println!(
        "{}{}{}",
        "╰".with(ACCENT),
        "─".repeat(SECTION_WIDTH).with(ACCENT),
        "╯".with(ACCENT)
    );
    println!();
}

pub fn print_key_value(key: &str, value: &str) {
    println!(
        "  {} {} {}",
        "●".with(FRAME),
        format!("{}:", key).with(MUTED),
        value.with(TEXT)
    );
}

pub fn print_key_value_highlight(key: &str, value: &str) {
    println!(
        "  {} {} {}",
        "◆".with(HIGHLIGHT),
        format!("{}:", key).with(ACCENT).bold(),
        value.with(OK).bold()
    );
}

pub fn print_list_item(item: &str, indent: usize) {
    println!("{}{}  {}", "  ".repeat(indent), "▶".with(ACCENT), item.with(TEXT));
}

pub fn print_empty_list(message: &str) {
    println!(
        "  {} {}",
        "○".with(MUTED),
        message.with(MUTED).attribute(Attribute::Italic)
    );
}

/// Heading line highlighted, each record as a list item.
pub fn print_answer(answer: &str) {
    let mut lines = answer.lines();
    if let Some(heading) = lines.next() {
        println!("  {}", heading.with(ACCENT).bold());
    }
    for line in lines {
        print_list_item(line, 1);
    }
    println!();
}

pub fn get_prompt() -> String {
    format!(
        "{}{}{} ",
        "❯".with(ACCENT).bold(),
        "❯".with(FRAME).bold(),
        "❯".with(HIGHLIGHT).bold(),
    )
}

pub fn print_welcome(node_source: &str, endpoints: usize) {
    print_banner();

    let edge = "║".with(FRAME);
    let rule = "═".repeat(WELCOME_WIDTH);
    println!("  {}{}{}", "╔".with(FRAME), rule.as_str().with(FRAME), "╗".with(FRAME));

    let endpoints = endpoints.to_string();
    let rows = [
        ("Nodes", node_source),
        ("Endpoints", endpoints.as_str()),
        ("Version", env!("CARGO_PKG_VERSION")),
        ("Build", env!("GIT_HASH")),
    ];
    for (key, value) in rows {
        let content = format!("  {} {}", format!("{}:", key).with(MUTED), value);
        let visible = key.width() + value.width() + 4;
        println!("  {}{}{}", edge, pad(&content, visible, WELCOME_WIDTH), edge);
    }

    let hint = "  Ask a question, or type ':help' for commands";
    println!("  {}{}{}", edge, " ".repeat(WELCOME_WIDTH), edge);
    println!(
        "  {}{}{}",
        edge,
        pad(&hint.with(MUTED).to_string(), hint.width(), WELCOME_WIDTH),
        edge
    );
    println!("  {}{}{}", "╚".with(FRAME), rule.as_str().with(FRAME), "╝".with(FRAME));
    println!();
}

pub struct CommandHelp {
    pub name: &'static str,
    pub args: &'static str,
    pub description: &'static str,
}

pub fn print_help(commands: &[CommandHelp]) {
    print_section_header("Available Commands");
    println!();
    println!("  {} {}", "◆".with(ACCENT), "Queries".with(ACCENT).bold());
    println!(
        "      {}",
        "Any other line is resolved as a question, e.g. \"top 5 trending tracks\"".with(TEXT)
    );
    println!();
    println!("  {} {}", "◆".with(WARN), "Commands".with(WARN).bold());
    for cmd in commands {
        println!(
            "      {} {}  {}",
            cmd.name.with(OK).bold(),
            cmd.args.with(MUTED),
            cmd.description.with(TEXT)
        );
    }
    println!();
    print_section_footer();
}

pub fn print_goodbye() {
    println!();
    println!("  {}", "Thanks for using Atris".with(FRAME).bold());
    println!();
}

pub fn flush() {
    let _ = io::stdout().flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_fill_centers_title() {
        assert_eq!(header_fill("Plan", 60), (27, 27));
        assert_eq!(header_fill("Nodes", 60), (26, 27));
        assert_eq!(header_fill(&"x".repeat(80), 60), (0, 0));
    }

    #[test]
    fn pad_counts_visible_columns() {
        assert_eq!(pad("ab", 2, 5), "ab   ");
        assert_eq!(pad("abcdef", 6, 3), "abcdef");
    }
}
