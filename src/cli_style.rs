use clap::builder::styling::{AnsiColor, Color, Style};
use clap::builder::Styles;
use crossterm::style::{Attribute, Stylize};
use unicode_width::UnicodeWidthStr;

pub fn get_styles() -> Styles {
    Styles::styled()
        .usage(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Yellow))),
        )
        .header(
            Style::new()
                .bold()
                .underline()
                .fg_color(Some(Color::Ansi(AnsiColor::Yellow))),
        )
        .literal(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green))))
        .error(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Red))),
        )
        .placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::BrightBlack))))
}

mod colors {
    use crossterm::style::Color;

    pub const ACCENT: Color = Color::Rgb {
        r: 255,
        g: 128,
        b: 0,
    };
    pub const GREEN: Color = Color::Rgb {
        r: 0,
        g: 224,
        b: 84,
    };
    pub const RED: Color = Color::Rgb {
        r: 255,
        g: 80,
        b: 80,
    };
    pub const BLUE: Color = Color::Rgb {
        r: 64,
        g: 188,
        b: 244,
    };
    pub const DIM: Color = Color::Rgb {
        r: 128,
        g: 128,
        b: 128,
    };
}

const RULE_WIDTH: usize = 48;

pub const PROMPT: &str = "betterboxd> ";

pub fn print_banner(db_path: &str) {
    println!("{}", "BETTERBOXD".with(colors::ACCENT).bold());
    println!("{}", format!("database: {}", db_path).with(colors::DIM));
    println!(
        "{}",
        "type 'help' for the list of commands".with(colors::DIM)
    );
    println!();
}

pub fn print_success(message: &str) {
    println!(" {} {}", "✓".with(colors::GREEN).bold(), message.with(colors::GREEN));
}

pub fn print_error(message: &str) {
    println!(" {} {}", "✗".with(colors::RED).bold(), message.with(colors::RED));
}

pub fn print_info(message: &str) {
    println!(" {} {}", "•".with(colors::BLUE), message);
}

pub fn print_section_header(title: &str) {
    let rule = "─".repeat(RULE_WIDTH.saturating_sub(title.width() + 1));
    println!();
    println!(
        "{} {}",
        title.with(colors::ACCENT).bold().attribute(Attribute::Italic),
        rule.with(colors::DIM)
    );
}

pub fn print_key_value(key: &str, value: &str) {
    println!("  {} {}", format!("{}:", key).with(colors::DIM), value);
}

pub fn print_ranked_item(rank: usize, item: &str) {
    println!("  {} {}", format!("{:>3}.", rank).with(colors::ACCENT), item);
}

pub fn print_empty_list(message: &str) {
    println!(
        "  {}",
        message.with(colors::DIM).attribute(Attribute::Italic)
    );
}

/// Renders a 0..=5 rating as five stars.
pub fn stars(rating: f64) -> String {
    let full = rating.round().clamp(0.0, 5.0) as usize;
    format!("{}{} {:.1}", "★".repeat(full), "☆".repeat(5 - full), rating)
}
