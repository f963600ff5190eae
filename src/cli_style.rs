//! Terminal rendering shared by the `rimas` and `cli-corpus` binaries.

use clap::builder::styling::{AnsiColor, Color, Style};
use clap::builder::Styles;
use crossterm::style::{Attribute, Color as CtColor, Stylize};
use unicode_width::UnicodeWidthStr;

const SECTION_WIDTH: usize = 60;
const VERSE_MIN_WIDTH: usize = 40;
const SCORE_CELLS: usize = 10;

fn ansi(color: AnsiColor) -> Style {
    Style::new().bold().fg_color(Some(Color::Ansi(color)))
}

pub fn get_styles() -> Styles {
    Styles::styled()
        .usage(ansi(AnsiColor::Yellow).underline())
        .header(ansi(AnsiColor::Yellow).underline())
        .literal(ansi(AnsiColor::Green))
        .valid(ansi(AnsiColor::Green))
        .invalid(ansi(AnsiColor::Red))
        .error(ansi(AnsiColor::Red))
        .placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::BrightBlack))))
}

/// Colours by role rather than by hue.
pub mod colors {
    use crossterm::style::Color;

    const fn rgb(r: u8, g: u8, b: u8) -> Color {
        Color::Rgb { r, g, b }
    }

    pub const FRAME: Color = rgb(255, 200, 60);
    pub const VERSE: Color = rgb(180, 100, 255);
    pub const TEXT: Color = rgb(240, 240, 240);
    pub const MUTED: Color = rgb(128, 128, 128);
    pub const INFO: Color = rgb(100, 149, 237);
    pub const GOOD: Color = rgb(0, 255, 136);
    pub const FAIR: Color = rgb(255, 165, 0);
    pub const POOR: Color = rgb(255, 85, 85);
}

mod glyphs {
    pub const THIN: &str = "─";
    pub const THIN_SIDE: &str = "│";
    pub const THICK: &str = "═";
    pub const THICK_SIDE: &str = "║";
    pub const MIC: &str = "♪";
    pub const ITEM: &str = "▸";
    pub const NONE: &str = "·";
}

/// A horizontal rule across `widths` columns, each padded by one space on
/// both sides, joined by `joint`.
fn rule(left: &str, widths: &[usize], joint: &str, right: &str) -> String {
    let cells: Vec<String> = widths.iter().map(|w| glyphs::THIN.repeat(w + 2)).collect();
    format!("{}{}{}", left, cells.join(joint), right)
}

pub fn print_banner(subtitle: &str) {
    const BANNER: [&str; 6] = [
        "    ██████╗ ██╗███╗   ███╗ █████╗ ███████╗",
        "    ██╔══██╗██║████╗ ████║██╔══██╗██╔════╝",
        "    ██████╔╝██║██╔████╔██║███████║███████╗",
        "    ██╔══██╗██║██║╚██╔╝██║██╔══██║╚════██║",
        "    ██║  ██║██║██║ ╚═╝ ██║██║  ██║███████║",
        "    ╚═╝  ╚═╝╚═╝╚═╝     ╚═╝╚═╝  ╚═╝╚══════╝",
    ];

    println!();
    for (i, line) in BANNER.iter().enumerate() {
        let color = if i < BANNER.len() / 2 {
            colors::FRAME
        } else {
            colors::VERSE
        };
        println!("{}", line.with(color).bold());
    }
    println!(
        "{}",
        format!("      {} {} {}", glyphs::MIC, subtitle, glyphs::MIC).with(colors::MUTED)
    );
    println!();
}

pub fn print_success(message: &str) {
    println!(" {} {}", "✓".with(colors::GOOD).bold(), message.with(colors::GOOD));
}

pub fn print_error(message: &str) {
    println!(" {} {}", "✗".with(colors::POOR).bold(), message.with(colors::POOR));
}

pub fn print_warning(message: &str) {
    println!(" {} {}", "!".with(colors::FAIR).bold(), message.with(colors::FAIR));
}

pub fn print_info(message: &str) {
    println!(" {} {}", "i".with(colors::INFO).bold(), message.with(colors::INFO));
}

pub fn print_section_header(title: &str) {
    let left = SECTION_WIDTH.saturating_sub(title.width() + 2) / 2;
    let right = SECTION_WIDTH.saturating_sub(title.width() + 2 + left);
    println!();
    println!(
        "{} {} {}",
        format!("╭{}", glyphs::THIN.repeat(left)).with(colors::FRAME),
        title.with(colors::FRAME).bold().attribute(Attribute::Italic),
        format!("{}╮", glyphs::THIN.repeat(right)).with(colors::FRAME)
    );
}

pub fn print_section_footer() {
    println!(
        "{}",
        format!("╰{}╯", glyphs::THIN.repeat(SECTION_WIDTH + 2)).with(colors::FRAME)
    );
    println!();
}

pub fn print_key_value(key: &str, value: &str) {
    println!(
        "  {} {}",
        format!("{}:", key).with(colors::MUTED),
        value.with(colors::TEXT)
    );
}

pub fn print_key_value_highlight(key: &str, value: &str) {
    println!(
        "  {} {}",
        format!("{}:", key).with(colors::FRAME).bold(),
        value.with(colors::GOOD).bold()
    );
}

pub fn print_list_item(item: &str, indent: usize) {
    println!(
        "{}{} {}",
        "  ".repeat(indent),
        glyphs::ITEM.with(colors::FRAME),
        item.with(colors::TEXT)
    );
}

pub fn print_empty_list(message: &str) {
    println!(
        "  {} {}",
        glyphs::NONE.with(colors::MUTED),
        message.with(colors::MUTED).attribute(Attribute::Italic)
    );
}

/// Column-aligned table; widths follow the widest cell per column.
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    widths: Vec<usize>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Table {
            widths: headers.iter().map(|h| h.width()).collect(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Cells past the header count are dropped.
    pub fn push(&mut self, cells: &[&str]) {
        let row: Vec<String> = cells
            .iter()
            .take(self.widths.len())
            .map(|c| c.to_string())
            .collect();
        for (width, cell) in self.widths.iter_mut().zip(&row) {
            *width = (*width).max(cell.width());
        }
        self.rows.push(row);
    }

    fn print_row(&self, cells: &[String], color: CtColor, bold: bool) {
        let side = glyphs::THIN_SIDE.with(colors::FRAME);
        print!("{}", side);
        for (cell, width) in cells.iter().zip(&self.widths) {
            let padded = format!(" {}{} ", cell, " ".repeat(width - cell.width()));
            if bold {
                print!("{}{}", padded.with(color).bold(), side);
            } else {
                print!("{}{}", padded.with(color), side);
            }
        }
        println!();
    }

    pub fn print(&self) {
        println!("{}", rule("╭", &self.widths, "┬", "╮").with(colors::FRAME));
        self.print_row(&self.headers, colors::FRAME, true);
        println!("{}", rule("├", &self.widths, "┼", "┤").with(colors::FRAME));
        for row in &self.rows {
            self.print_row(row, colors::TEXT, false);
        }
        println!("{}", rule("╰", &self.widths, "┴", "╯").with(colors::FRAME));
    }
}

/// Draws the verses inside a double-line box.
pub fn print_verses(verses: &[String]) {
    let inner = verses
        .iter()
        .map(|v| v.width())
        .max()
        .unwrap_or(0)
        .max(VERSE_MIN_WIDTH)
        + 4;
    let edge = glyphs::THICK.repeat(inner);

    println!("  {}", format!("╔{}╗", edge).with(colors::VERSE));
    for verse in verses {
        println!(
            "  {}  {}{}{}",
            glyphs::THICK_SIDE.with(colors::VERSE),
            verse.as_str().with(colors::TEXT).bold(),
            " ".repeat(inner.saturating_sub(verse.width() + 2)),
            glyphs::THICK_SIDE.with(colors::VERSE)
        );
    }
    println!("  {}", format!("╚{}╝", edge).with(colors::VERSE));
}

fn score_color(score: f64) -> CtColor {
    if score >= 7.0 {
        colors::GOOD
    } else if score >= 5.0 {
        colors::FAIR
    } else {
        colors::POOR
    }
}

/// Filled cells of the bar for a 0-10 score.
fn filled_cells(score: f64) -> usize {
    (score.clamp(0.0, 10.0).round() as usize).min(SCORE_CELLS)
}

pub fn print_score_bar(label: &str, score: f64) {
    let filled = filled_cells(score);
    let color = score_color(score);
    println!(
        "  {:<14} {}{} {}",
        label.with(colors::MUTED),
        "█".repeat(filled).with(color),
        "░".repeat(SCORE_CELLS - filled).with(colors::MUTED),
        format!("{:.1}", score).with(color).bold()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_pads_each_column() {
        assert_eq!(rule("╭", &[1, 3], "┬", "╮"), "╭───┬─────╮");
        assert_eq!(rule("├", &[], "┼", "┤"), "├┤");
    }

    #[test]
    fn test_table_widths_follow_widest_cell() {
        let mut table = Table::new(&["Word", "Score"]);
        table.push(&["canção", "1.00"]);
        table.push(&["nação", "0.80", "ignored"]);
        assert_eq!(table.widths, vec![6, 5]);
        assert_eq!(table.rows[1].len(), 2);
    }

    #[test]
    fn test_score_bar_cells() {
        assert_eq!(filled_cells(9.2), 9);
        assert_eq!(filled_cells(6.5), 7);
        assert_eq!(filled_cells(-1.0), 0);
        assert_eq!(filled_cells(12.0), 10);
        assert_eq!(score_color(7.0), colors::GOOD);
        assert_eq!(score_color(4.9), colors::POOR);
    }
}
