use crate::chart::ChartStatus;
use clap::builder::styling::{AnsiColor, Color, Style};
use clap::builder::Styles;
use crossterm::style::{Attribute, Color as CtColor, Stylize};
use unicode_width::UnicodeWidthStr;

// ═══════════════════════════════════════════════════════════════════════════════
// Clap Styles
// ═══════════════════════════════════════════════════════════════════════════════

pub fn get_styles() -> Styles {
    let heading = Style::new()
        .bold()
        .underline()
        .fg_color(Some(Color::Ansi(AnsiColor::Cyan)));
    let good = Style::new()
        .bold()
        .fg_color(Some(Color::Ansi(AnsiColor::Green)));
    let bad = Style::new()
        .bold()
        .fg_color(Some(Color::Ansi(AnsiColor::Red)));

    Styles::styled()
        .usage(heading)
        .header(heading)
        .literal(good)
        .valid(good)
        .invalid(bad)
        .error(bad)
        .placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::BrightBlack))))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Color Palette
// ═══════════════════════════════════════════════════════════════════════════════

pub mod colors {
    use crossterm::style::Color;

    pub const CYAN: Color = Color::Rgb {
        r: 0,
        g: 255,
        b: 255,
    };
    pub const PURPLE: Color = Color::Rgb {
        r: 180,
        g: 100,
        b: 255,
    };
    pub const GOLD: Color = Color::Rgb {
        r: 255,
        g: 215,
        b: 0,
    };
    pub const GREEN: Color = Color::Rgb {
        r: 0,
        g: 255,
        b: 136,
    };
    pub const ORANGE: Color = Color::Rgb {
        r: 255,
        g: 165,
        b: 0,
    };
    pub const RED: Color = Color::Rgb {
        r: 255,
        g: 85,
        b: 85,
    };
    pub const DIM: Color = Color::Rgb {
        r: 128,
        g: 128,
        b: 128,
    };
    pub const WHITE: Color = Color::Rgb {
        r: 255,
        g: 255,
        b: 255,
    };
}

mod box_chars {
    pub const ROUND_TOP_LEFT: &str = "╭";
    pub const ROUND_TOP_RIGHT: &str = "╮";
    pub const ROUND_BOTTOM_LEFT: &str = "╰";
    pub const ROUND_BOTTOM_RIGHT: &str = "╯";
    pub const HORIZONTAL: &str = "─";
    pub const VERTICAL: &str = "│";
    pub const T_LEFT: &str = "├";
    pub const T_RIGHT: &str = "┤";
    pub const T_TOP: &str = "┬";
    pub const T_BOTTOM: &str = "┴";
    pub const CROSS: &str = "┼";
    pub const BULLET: &str = "●";
    pub const BULLET_EMPTY: &str = "○";
    pub const STAR: &str = "★";
    pub const CHECK: &str = "✓";
    pub const CROSS_MARK: &str = "✗";
}

pub fn print_banner() {
    println!();
    println!(
        "  {} {} {}",
        box_chars::STAR.with(colors::GOLD),
        "PEZZOTTIFY CHARTS".with(colors::CYAN).bold(),
        box_chars::STAR.with(colors::GOLD)
    );
    println!("{}", "  ═══════════  weekly song charts  ═══════════".with(colors::DIM));
}

// ═══════════════════════════════════════════════════════════════════════════════
// Status Indicators
// ═══════════════════════════════════════════════════════════════════════════════

pub fn print_success(message: &str) {
    println!(
        " {} {}",
        box_chars::CHECK.to_string().with(colors::GREEN).bold(),
        message.with(colors::GREEN)
    );
}

pub fn print_error(message: &str) {
    eprintln!(
        " {} {}",
        box_chars::CROSS_MARK.to_string().with(colors::RED).bold(),
        message.with(colors::RED)
    );
}

pub fn print_warning(message: &str) {
    println!(
        " {} {}",
        "⚠".with(colors::ORANGE).bold(),
        message.with(colors::ORANGE)
    );
}

// ═══════════════════════════════════════════════════════════════════════════════
// Sections
// ═══════════════════════════════════════════════════════════════════════════════

const SECTION_WIDTH: usize = 60;

pub fn print_section_header(title: &str) {
    let title_len = title.width();
    let padding = SECTION_WIDTH.saturating_sub(title_len + 4) / 2;
    let rest = SECTION_WIDTH.saturating_sub(title_len + 4 + padding);

    println!();
    println!(
        "{}{} {} {}{}",
        box_chars::ROUND_TOP_LEFT.with(colors::CYAN),
        box_chars::HORIZONTAL.repeat(padding).with(colors::CYAN),
        title.with(colors::CYAN).bold().attribute(Attribute::Italic),
        box_chars::HORIZONTAL.repeat(rest).with(colors::CYAN),
        box_chars::ROUND_TOP_RIGHT.with(colors::CYAN)
    );
}

pub fn print_section_footer() {
    println!(
        "{}{}{}",
        box_chars::ROUND_BOTTOM_LEFT.with(colors::CYAN),
        box_chars::HORIZONTAL.repeat(SECTION_WIDTH).with(colors::CYAN),
        box_chars::ROUND_BOTTOM_RIGHT.with(colors::CYAN)
    );
    println!();
}

pub fn print_key_value(key: &str, value: &str) {
    println!(
        "  {} {} {}",
        box_chars::BULLET.with(colors::PURPLE),
        format!("{}:", key).with(colors::DIM),
        value.with(colors::WHITE)
    );
}

pub fn print_empty_list(message: &str) {
    println!(
        "  {} {}",
        box_chars::BULLET_EMPTY.with(colors::DIM),
        message.with(colors::DIM).attribute(Attribute::Italic)
    );
}

/// Color of a chart movement marker.
pub fn status_color(status: &ChartStatus) -> CtColor {
    match status {
        ChartStatus::New => colors::GOLD,
        ChartStatus::ReEntry => colors::PURPLE,
        ChartStatus::Up(_) => colors::GREEN,
        ChartStatus::Down(_) => colors::RED,
        ChartStatus::Unchanged => colors::DIM,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Table Display
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// Pads `cell` to `width` display columns.
pub fn pad(cell: &str, width: usize, align: Align) -> String {
    let fill = " ".repeat(width.saturating_sub(cell.width()));
    match align {
        Align::Left => format!("{}{}", cell, fill),
        Align::Right => format!("{}{}", fill, cell),
    }
}

struct Cell {
    text: String,
    color: CtColor,
}

pub struct TableBuilder {
    headers: Vec<String>,
    aligns: Vec<Align>,
    rows: Vec<Vec<Cell>>,
    col_widths: Vec<usize>,
}

impl TableBuilder {
    pub fn new(headers: Vec<&str>) -> Self {
        TableBuilder {
            col_widths: headers.iter().map(|h| h.width()).collect(),
            aligns: vec![Align::Left; headers.len()],
            headers: headers.into_iter().map(String::from).collect(),
            rows: Vec::new(),
        }
    }

    /// Right-aligns the given columns, for numbers.
    pub fn align_right(mut self, columns: &[usize]) -> Self {
        for &column in columns {
            if let Some(align) = self.aligns.get_mut(column) {
                *align = Align::Right;
            }
        }
        self
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        self.add_colored_row(row.into_iter().map(|c| (c, colors::WHITE)).collect());
    }

    pub fn add_colored_row(&mut self, row: Vec<(String, CtColor)>) {
        for (i, (text, _)) in row.iter().enumerate() {
            if let Some(width) = self.col_widths.get_mut(i) {
                *width = (*width).max(text.width());
            }
        }
        self.rows.push(
            row.into_iter()
                .map(|(text, color)| Cell { text, color })
                .collect(),
        );
    }

    pub fn column_widths(&self) -> &[usize] {
        &self.col_widths
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn print_border(&self, left: &str, middle: &str, right: &str) {
        let line = self
            .col_widths
            .iter()
            .map(|w| box_chars::HORIZONTAL.repeat(w + 2))
            .collect::<Vec<_>>()
            .join(middle);
        println!("{}", format!("{}{}{}", left, line, right).with(colors::CYAN));
    }

    pub fn print(&self) {
        let bar = box_chars::VERTICAL.with(colors::CYAN);

        self.print_border(
            box_chars::ROUND_TOP_LEFT,
            box_chars::T_TOP,
            box_chars::ROUND_TOP_RIGHT,
        );

        print!("{}", bar);
        for (i, header) in self.headers.iter().enumerate() {
            let text = pad(header, self.col_widths[i], self.aligns[i]);
            print!(" {} {}", text.with(colors::CYAN).bold(), bar);
        }
        println!();

        self.print_border(box_chars::T_LEFT, box_chars::CROSS, box_chars::T_RIGHT);

        for row in &self.rows {
            print!("{}", bar);
            for (i, cell) in row.iter().enumerate() {
                let width = self.col_widths.get(i).copied().unwrap_or(0);
                let align = self.aligns.get(i).copied().unwrap_or(Align::Left);
                print!(" {} {}", pad(&cell.text, width, align).with(cell.color), bar);
            }
            println!();
        }

        self.print_border(
            box_chars::ROUND_BOTTOM_LEFT,
            box_chars::T_BOTTOM,
            box_chars::ROUND_BOTTOM_RIGHT,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pad_uses_display_width() {
        assert_eq!(pad("7", 3, Align::Right), "  7");
        assert_eq!(pad("ab", 4, Align::Left), "ab  ");
        // Wide characters take two columns
        assert_eq!(pad("東京", 5, Align::Left), "東京 ");
        assert_eq!(pad("toolong", 3, Align::Left), "toolong");
    }

    #[test]
    fn test_table_tracks_column_widths() {
        let mut table = TableBuilder::new(vec!["Pos", "Title"]).align_right(&[0, 9]);
        assert!(table.is_empty());
        table.add_row(vec!["100".to_string(), "Song".to_string()]);
        table.add_row(vec!["1".to_string(), "A Much Longer Title".to_string()]);
        assert_eq!(table.column_widths(), &[3, 19]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_status_colors() {
        assert_eq!(status_color(&ChartStatus::New), colors::GOLD);
        assert_eq!(status_color(&ChartStatus::Down(3)), colors::RED);
        assert_eq!(status_color(&ChartStatus::Up(1)), colors::GREEN);
    }
}
