use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table};

use crate::app::ViewState;
use crate::process;

const HEADER_HEIGHT: u16 = 4;
const INFO_HEIGHT: u16 = 2;
/// Column titles plus the blank margin under them.
const TABLE_HEADER_HEIGHT: u16 = 2;
const FOOTER_HEIGHT: u16 = 2;

/// Lines taken by everything except the table rows.
pub const CHROME_HEIGHT: u16 = HEADER_HEIGHT + INFO_HEIGHT + TABLE_HEADER_HEIGHT + FOOTER_HEIGHT;

/// Widest the NAME column gets.
const NAME_WIDTH: usize = 35;
const MIN_NAME_WIDTH: usize = 12;
/// PID, CPU %, RAM %, MEMORY, and the four column gaps.
const FIXED_COLUMNS: usize = 10 + 10 + 10 + 15 + 4;

// ── Main layout ─────────────────────────────────────────────

/// Renders the whole session view. Output depends only on `state` and the
/// frame size.
pub fn draw(f: &mut Frame, state: &ViewState) {
    let rows = u16::try_from(state.visible_rows()).unwrap_or(u16::MAX);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Length(INFO_HEIGHT),
            Constraint::Length(rows.saturating_add(TABLE_HEADER_HEIGHT)),
            Constraint::Length(FOOTER_HEIGHT),
            Constraint::Min(0),
        ])
        .split(f.area());

    draw_header(f, chunks[0]);
    draw_info_bar(f, state, chunks[1]);
    draw_process_table(f, state, chunks[2]);
    draw_footer(f, chunks[3]);
}

fn draw_header(f: &mut Frame, area: Rect) {
    let accent = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let text = vec![
        Line::from(Span::styled("RESMON - Interactive Process Manager", accent)),
        Line::from(Span::styled(
            "Real-time System Resource Monitor",
            Style::default().fg(Color::Green),
        )),
    ];

    let widget = Paragraph::new(text)
        .alignment(Alignment::Center)
        .block(bordered("").border_style(accent));
    f.render_widget(widget, area);
}

// ── Info bar ────────────────────────────────────────────────

fn draw_info_bar(f: &mut Frame, state: &ViewState, area: Rect) {
    let (total_cpu, total_ram) = process::totals(state.processes());
    let total_gb = state.total_memory() as f64 / GIB;

    let line = Line::from(vec![
        Span::raw("  "),
        label("Processes:", Color::Cyan),
        Span::raw(format!(" {}  ", state.processes().len())),
        label("Total CPU:", Color::Green),
        Span::raw(format!(" {total_cpu:.2}%  ")),
        label("Total RAM:", Color::Magenta),
        Span::raw(format!(" {total_ram:.2}% ({total_gb:.2} GB)  ")),
        label("Sort by:", Color::White),
        Span::raw(" "),
        Span::styled(state.sort_mode().label(), Style::default().fg(Color::Yellow)),
    ]);

    f.render_widget(Paragraph::new(line), area);
}

// ── Process table ───────────────────────────────────────────

fn draw_process_table(f: &mut Frame, state: &ViewState, area: Rect) {
    let header = Row::new(vec![
        format!("  {:<8}", "PID"),
        "NAME".to_string(),
        format!("{:>10}", "CPU %"),
        format!("{:>10}", "RAM %"),
        format!("{:>15}", "MEMORY"),
    ])
    .style(Style::default().add_modifier(Modifier::BOLD))
    .bottom_margin(1);

    let name_width = name_width(state.viewport().width);
    let selected = state.selected_index();
    let rows: Vec<Row> = state
        .window()
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let row = Row::new(vec![
                format!("  {:<8}", p.pid),
                truncate_name(&p.name, name_width),
                format!("{:>9.2}%", p.cpu_percent),
                format!("{:>9.2}%", p.ram_percent),
                format!("{:>15}", fmt_bytes(p.ram_bytes)),
            ]);

            if state.scroll_offset() + i == selected {
                row.style(
                    Style::default()
                        .bg(Color::Blue)
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                row
            }
        })
        .collect();

    let widths = [
        Constraint::Length(10),
        Constraint::Length(u16::try_from(name_width).unwrap_or(u16::MAX)),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(15),
    ];

    // The area is sized for the full window, so short lists leave blank
    // rows and the footer never moves.
    let table = Table::new(rows, widths).header(header).column_spacing(1);
    f.render_widget(table, area);
}

fn draw_footer(f: &mut Frame, area: Rect) {
    let line = Line::from(vec![
        Span::raw("  "),
        key_hint("[↑/↓]", Color::Cyan),
        Span::raw(" Navigate  "),
        key_hint("[F5/R]", Color::Yellow),
        Span::raw(" Refresh  "),
        key_hint("[C]", Color::Green),
        Span::raw(" CPU  "),
        key_hint("[M]", Color::Magenta),
        Span::raw(" RAM  "),
        key_hint("[P]", Color::Yellow),
        Span::raw(" PID  "),
        key_hint("[D/DEL]", Color::Red),
        Span::raw(" Kill Process  "),
        key_hint("[Q/ESC]", Color::White),
        Span::raw(" Quit"),
    ]);

    let widget = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(widget, area);
}

// ── Helpers ─────────────────────────────────────────────────

const GIB: f64 = 1_073_741_824.0;

fn bordered(title: &str) -> Block<'_> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
}

fn label(text: &str, color: Color) -> Span<'_> {
    Span::styled(text, Style::default().fg(color).add_modifier(Modifier::BOLD))
}

fn key_hint(text: &str, color: Color) -> Span<'_> {
    label(text, color)
}

/// NAME column width for a terminal `width` cells wide.
fn name_width(width: u16) -> usize {
    usize::from(width)
        .saturating_sub(FIXED_COLUMNS)
        .clamp(MIN_NAME_WIDTH, NAME_WIDTH)
}

/// Cuts `name` to `max` characters, marking the cut with "...".
pub fn truncate_name(name: &str, max: usize) -> String {
    if name.chars().count() <= max {
        return name.to_string();
    }
    if max <= 3 {
        return name.chars().take(max).collect();
    }
    let mut out: String = name.chars().take(max - 3).collect();
    out.push_str("...");
    out
}

/// Human-readable byte count with 1024 steps.
pub fn fmt_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    const TB: u64 = GB * 1024;

    if bytes >= TB {
        format!("{:.2} TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}
