use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::app::{App, InputMode};
use crate::fetch::FetchResult;
use crate::form::FormFocus;
use crate::model::{FormField, ResourceKind};
use crate::workflow::SubmissionState;

const PAGE_TITLE: &str = "Setup Namespace Based Backup";

const BG: Color = Color::Rgb(9, 15, 25);
const PANEL: Color = Color::Rgb(16, 27, 44);
const ACCENT: Color = Color::Rgb(52, 211, 153);
const MUTED: Color = Color::Rgb(140, 156, 178);
const WARN: Color = Color::Rgb(251, 191, 36);
const ERROR: Color = Color::Rgb(248, 113, 113);
const PL_A: Color = Color::Rgb(17, 94, 89);
const PL_B: Color = Color::Rgb(30, 64, 175);
const PL_C: Color = Color::Rgb(55, 48, 163);

pub fn render(frame: &mut Frame, app: &App) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(6),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, root[0], app);
    render_body(frame, root[1], app);
    render_footer(frame, root[2], app);

    if app.show_help() {
        render_help_modal(frame, app);
    }
}

fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let mut spans = Vec::new();
    push_powerline_segment(&mut spans, " NSBACKUP ", Color::Black, ACCENT, PL_A);
    push_powerline_segment(
        &mut spans,
        format!(" 󰠳 {} ", compact_text(&display_cluster_endpoint(app.cluster()), 26)),
        Color::White,
        PL_A,
        PL_B,
    );
    push_powerline_segment(
        &mut spans,
        format!(" 󱃾 {} ", compact_text(app.context(), 16)),
        Color::White,
        PL_B,
        PL_C,
    );
    push_powerline_segment(
        &mut spans,
        format!(" 󰉋 {} ", compact_text(app.admin_namespace(), 16)),
        Color::White,
        PL_C,
        BG,
    );
    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(BG)),
        area,
    );
}

fn render_body(frame: &mut Frame, area: Rect, app: &App) {
    let page = Block::default()
        .title(Span::styled(
            format!(" {PAGE_TITLE} "),
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(MUTED))
        .style(Style::default().bg(BG));
    let inner = page.inner(area);
    frame.render_widget(page, area);

    let grid = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(6, 12), Constraint::Ratio(6, 12)])
        .split(inner);

    render_form(frame, grid[0], app);
    render_side_panel(frame, grid[1], app);
}

fn render_form(frame: &mut Frame, area: Rect, app: &App) {
    let form = app.form();
    let values = form.values();
    let mut lines = Vec::new();

    for field in FormField::ALL {
        let focused = form.focus() == FormFocus::Field(field);
        let label_style = if focused {
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(MUTED)
        };
        lines.push(Line::from(Span::styled(field.label(), label_style)));

        let raw = values.value(field);
        let shown = if field.is_secret() && !raw.is_empty() {
            "•".repeat(raw.chars().count())
        } else {
            raw.to_string()
        };
        let control = if field.options_source().is_some() {
            let placeholder = if shown.is_empty() { "-" } else { shown.as_str() };
            format!("◀ {placeholder} ▶")
        } else if focused && form.editing() {
            format!("{shown}▏")
        } else {
            shown
        };
        let control_style = if focused {
            Style::default().fg(Color::White).bg(PANEL)
        } else {
            Style::default().fg(Color::White)
        };
        let marker = if focused { "› " } else { "  " };
        lines.push(Line::from(vec![
            Span::styled(marker, Style::default().fg(ACCENT)),
            Span::styled(control, control_style),
        ]));
        lines.push(Line::from(""));
    }

    if app.show_license() {
        lines.push(Line::from(Span::styled(
            "License",
            Style::default().fg(MUTED),
        )));
        lines.push(Line::from(Span::styled(
            format!("  {}", form.license().unwrap_or("-")),
            Style::default().fg(MUTED).add_modifier(Modifier::ITALIC),
        )));
        lines.push(Line::from(""));
    }

    if let SubmissionState::Failed(error) = app.submission() {
        lines.push(Line::from(Span::styled(
            format!("󰅚 {}", error.user_message()),
            Style::default().fg(Color::Black).bg(ERROR),
        )));
        lines.push(Line::from(""));
    }

    let submit_focused = form.focus() == FormFocus::Submit;
    let submit_style = if submit_focused {
        Style::default()
            .fg(Color::Black)
            .bg(ACCENT)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(ACCENT)
    };
    let submit_label = if app.submission().in_flight() {
        "[ Submitting… ]"
    } else {
        "[ Submit ]"
    };
    lines.push(Line::from(Span::styled(submit_label, submit_style)));

    let panel = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title("Backup Target")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(ACCENT))
                .style(Style::default().bg(BG)),
        );
    frame.render_widget(panel, area);
}

fn render_side_panel(frame: &mut Frame, area: Rect, app: &App) {
    let mut lines = vec![Line::from(Span::styled(
        "Cluster lists",
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    ))];
    for kind in ResourceKind::ALL {
        if kind == ResourceKind::Licenses && !app.show_license() {
            continue;
        }
        if let Some(result) = app.fetch(kind) {
            lines.push(fetch_line(kind, result));
        }
    }

    if let Some(cluster) = app.selected_cluster() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("Source {}", cluster.name),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(Span::styled(
            format!("  uid {}", compact_text(&cluster.uid, 36)),
            Style::default().fg(MUTED),
        )));
        let labels = cluster
            .labels
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join(" ");
        lines.push(Line::from(Span::styled(
            format!("  labels {}", if labels.is_empty() { "-" } else { labels.as_str() }),
            Style::default().fg(MUTED),
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Submission",
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    )));
    let (state_text, state_color) = match app.submission() {
        SubmissionState::Idle => ("idle".to_string(), MUTED),
        SubmissionState::Submitting => ("submitting…".to_string(), WARN),
        SubmissionState::Success { completed } => (
            format!(
                "saved ({})",
                completed
                    .iter()
                    .map(|step| step.describe())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            ACCENT,
        ),
        SubmissionState::Failed(error) => {
            let mut text = format!("{} failed", error.step.describe());
            if error.left_orphans() {
                text.push_str(", config map left in place");
            }
            (text, ERROR)
        }
    };
    lines.push(Line::from(Span::styled(
        format!("  {state_text}"),
        Style::default().fg(state_color),
    )));
    if !app.label_cluster() {
        lines.push(Line::from(Span::styled(
            "  cluster labelling disabled",
            Style::default().fg(MUTED),
        )));
    }

    let panel = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
        Block::default()
            .title("Status")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(MUTED))
            .style(Style::default().bg(BG)),
    );
    frame.render_widget(panel, area);
}

fn fetch_line(kind: ResourceKind, result: &FetchResult) -> Line<'static> {
    let (state, color) = if result.loading {
        ("loading".to_string(), WARN)
    } else if let Some(error) = &result.error {
        (compact_text(&error.message, 40), ERROR)
    } else if let Some(at) = result.refreshed_at {
        (
            format!("{} items @ {}", result.items.len(), at.format("%H:%M:%S")),
            ACCENT,
        )
    } else {
        ("not loaded".to_string(), MUTED)
    };
    Line::from(vec![
        Span::styled(format!("  {:<16}", kind.title()), Style::default().fg(MUTED)),
        Span::styled(state, Style::default().fg(color)),
    ])
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
    let mut spans = Vec::new();
    let (label, fg, bg) = match app.mode() {
        InputMode::Normal => (" 󰘳 nrm ", Color::White, PL_A),
        InputMode::Editing => (" 󰏫 edit ", Color::Black, WARN),
    };
    push_powerline_segment(&mut spans, label, fg, bg, PL_B);
    let status = app.status();
    push_powerline_segment(
        &mut spans,
        format!(
            " {} {} ",
            footer_status_icon(status),
            compact_text(status, area.width.saturating_sub(14).max(24) as usize)
        ),
        Color::White,
        PL_B,
        BG,
    );
    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(BG)),
        area,
    );
}

fn render_help_modal(frame: &mut Frame, app: &App) {
    let area = centered_rect(64, 60, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(format!(
            "nsbackup help  mode:{}  state:{}",
            help_mode_label(app.mode()),
            app.submission().label()
        )),
        Line::from(""),
    ];
    for line in [
        "Tab/j/Down next field   Shift-Tab/k/Up previous field",
        "Left/Right cycle cluster or namespace",
        "Enter/i edit text field   Enter/Esc finish editing",
        "Ctrl-S or Enter on [ Submit ] submit",
        "r refresh lists   Esc dismiss error   q quit",
    ] {
        lines.push(Line::from(line));
    }

    let modal = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title("Help")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(ACCENT))
                .style(Style::default().bg(PANEL)),
        )
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Left);

    frame.render_widget(modal, area);
}

fn help_mode_label(mode: InputMode) -> &'static str {
    match mode {
        InputMode::Normal => "normal",
        InputMode::Editing => "editing",
    }
}

fn footer_status_icon(status_text: &str) -> &'static str {
    let status = status_text.to_ascii_lowercase();
    let has_failure = ["failed", "error", "forbidden", "denied", "refused"]
        .iter()
        .any(|needle| status.contains(needle));
    if has_failure { "󰅚" } else { "󰄬" }
}

fn push_powerline_segment(
    spans: &mut Vec<Span<'static>>,
    content: impl Into<String>,
    fg: Color,
    bg: Color,
    next_bg: Color,
) {
    spans.push(Span::styled(
        content.into(),
        Style::default().fg(fg).bg(bg).add_modifier(Modifier::BOLD),
    ));
    spans.push(Span::styled("", Style::default().fg(bg).bg(next_bg)));
}

fn compact_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }

    if max_chars <= 1 {
        return "…".to_string();
    }

    let mut out = value
        .chars()
        .take(max_chars.saturating_sub(1))
        .collect::<String>();
    out.push('…');
    out
}

fn display_cluster_endpoint(cluster: &str) -> String {
    let trimmed = cluster.trim().trim_end_matches('/');
    trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed)
        .to_string()
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
