use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Tabs, Wrap},
    Frame,
};

use crate::analysis::{Bucket, BucketSelector, ScreenedCompany};
use crate::models::CompanyRecord;
use crate::ui::format;
use crate::ui::state::{AppState, Entry, LogLevel, Mode};

fn bucket_color(bucket: Bucket) -> Color {
    match bucket {
        Bucket::Overvalued => Color::Red,
        Bucket::UndervaluedLow => Color::White,
        Bucket::UndervaluedMid => Color::Yellow,
        Bucket::UndervaluedHigh => Color::Green,
    }
}

/// Draw the whole screen
pub fn render(f: &mut Frame, state: &mut AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Filter tabs
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Status bar
        ])
        .split(f.area());

    render_filter_tabs(f, chunks[0], state);

    let content = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[1]);
    render_company_list(f, content[0], state);
    render_detail(f, content[1], state);

    render_status_bar(f, chunks[2], state);
}

fn render_filter_tabs(f: &mut Frame, area: Rect, state: &AppState) {
    let titles: Vec<&str> = BucketSelector::MENU
        .iter()
        .map(|s| format::selector_label(*s))
        .collect();

    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).title("Stock Valuator"))
        .style(Style::default().fg(Color::White))
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .select(state.selector_index);

    f.render_widget(tabs, area);
}

fn render_company_list(f: &mut Frame, area: Rect, state: &mut AppState) {
    let items: Vec<ListItem> = state
        .visible
        .iter()
        .map(|entry| {
            let value = match entry {
                Entry::Valued(company) => Span::styled(
                    format!("{:>10}", format::percent(company.valuation.undervaluation_pct)),
                    Style::default().fg(bucket_color(company.valuation.bucket())),
                ),
                Entry::Unvalued { .. } => {
                    Span::styled(format!("{:>10}", "n/a"), Style::default().fg(Color::DarkGray))
                }
            };
            ListItem::new(Line::from(vec![
                Span::raw(format!("{:<24}", entry.name())),
                value,
            ]))
        })
        .collect();

    let title = format!("Companies ({}/{})", state.visible.len(), state.records.len());
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");

    f.render_stateful_widget(list, area, &mut state.list_state);
}

fn detail_lines(company: &ScreenedCompany) -> Vec<Line<'static>> {
    let v = &company.valuation;
    let r = &company.record;
    let bucket = v.bucket();

    let mut lines = vec![
        Line::from(Span::styled(
            r.name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(format!("Current price:      {}", format::money(r.current_price))),
        Line::from(format!("Target price:       {}", format::money(v.target_price))),
        Line::from(vec![
            Span::raw("Undervaluation:     "),
            Span::styled(
                format::percent(v.undervaluation_pct),
                Style::default().fg(bucket_color(bucket)),
            ),
            Span::raw(format!("  ({})", format::bucket_label(bucket))),
        ]),
        Line::from(""),
    ];

    for mp in &v.buy_prices {
        lines.push(Line::from(format!(
            "Buy below ({} margin): {}",
            format::margin_label(mp.margin),
            format::money(mp.price)
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(format!(
        "Avg P/E {}  Avg P/S {}  Avg EPS {}  Growth x{:.4}",
        format::money(v.avg_pe),
        format::money(v.avg_ps),
        format::money(v.avg_earnings),
        v.growth_factor
    )));
    lines.push(Line::from(format!(
        "Target via P/E {}  via P/S {}",
        format::money(v.target_via_pe),
        format::money(v.target_via_ps)
    )));
    if let Some(peg) = v.avg_peg {
        lines.push(Line::from(format!("Avg PEG {}", format::money(peg))));
    }

    lines
}

fn unvalued_lines(record: &CompanyRecord, reason: &str) -> Vec<Line<'static>> {
    vec![
        Line::from(Span::styled(
            record.name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(format!("Current price:      {}", format::money(record.current_price))),
        Line::from(Span::styled(
            reason.to_string(),
            Style::default().fg(Color::Red),
        )),
    ]
}

fn render_detail(f: &mut Frame, area: Rect, state: &AppState) {
    let mut lines = match state.selected() {
        Some(Entry::Valued(company)) => detail_lines(company),
        Some(Entry::Unvalued { record, reason }) => unvalued_lines(record, reason),
        None => vec![Line::from("No companies match the selected filter.")],
    };

    // Under "Show all" these companies are rows of their own
    if state.selector() != BucketSelector::All && !state.unvalued.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Not valued:",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )));
        for (name, reason) in &state.unvalued {
            lines.push(Line::from(format!("• {}: {}", name, reason)));
        }
    }

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Analysis"))
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, state: &AppState) {
    let line = if let Mode::ConfirmDelete(name) = &state.mode {
        Line::from(vec![
            Span::styled(
                format!("Delete {}? ", name),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
            Span::styled("y", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
            Span::raw(" to confirm, any other key to cancel"),
        ])
    } else if let Some(status) = &state.status {
        let color = match status.level {
            LogLevel::Info => Color::Gray,
            LogLevel::Success => Color::Green,
            LogLevel::Warning => Color::Yellow,
            LogLevel::Error => Color::Red,
        };
        Line::from(Span::styled(status.text.clone(), Style::default().fg(color)))
    } else {
        Line::from(vec![
            Span::styled("Tab", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
            Span::styled(" filter • ", Style::default().fg(Color::Gray)),
            Span::styled("↑/↓", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
            Span::styled(" select • ", Style::default().fg(Color::Gray)),
            Span::styled("D", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
            Span::styled(" delete • ", Style::default().fg(Color::Gray)),
            Span::styled("R", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            Span::styled(" reload • ", Style::default().fg(Color::Gray)),
            Span::styled("Q", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
            Span::styled(" quit", Style::default().fg(Color::Gray)),
        ])
    };

    let paragraph = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
    f.render_widget(paragraph, area);
}
