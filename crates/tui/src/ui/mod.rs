use ratatui::{
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
    Frame,
};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::app::{App, ConfirmAction, Focus};
use crate::strings::{
    build_status_line, help_lines_ascii, history_row, history_title, viewer_lines, ADDRESS_HINT,
    CONFIRM_CLEAR_HISTORY, TITLE_ADDRESS, TITLE_CONFIRM, TITLE_HELP, TITLE_VIEWER,
};
use crate::theme::THEME;

pub fn draw(f: &mut Frame, app: &mut App) {
    // Layout: content row (viewer + optional history pane), status, address bar
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(3),
        ])
        .split(f.area());

    let mut constraints = vec![Constraint::Min(10)];
    if app.history.visible {
        constraints.push(Constraint::Percentage(45));
    }
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(rows[0]);

    draw_viewer(f, cols[0], app);
    if app.history.visible {
        app.history_area = Some(cols[1]);
        draw_history(f, cols[1], app);
    } else {
        app.history_area = None;
    }
    draw_status(f, rows[1], app);
    draw_address(f, rows[2], app);

    if let Some(action) = app.confirm {
        draw_confirm(f, f.area(), action);
    }
    if app.show_help {
        draw_help(f, f.area());
    }
}

fn draw_viewer(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .title(TITLE_VIEWER)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(THEME.viewer_border));
    let when = app
        .viewer
        .requested_at
        .map(|t| t.format("%d %b %y %H:%M:%S").to_string());
    let lines: Vec<Line> = viewer_lines(
        app.viewer.current.as_deref(),
        when.as_deref(),
        app.viewer.visits,
    )
    .into_iter()
    .map(Line::from)
    .collect();
    let para = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(para, area);
}

fn draw_history(f: &mut Frame, area: Rect, app: &App) {
    let focused = matches!(app.focus, Focus::History);
    let border_style = if focused {
        Style::default().fg(THEME.border_focus)
    } else {
        Style::default().fg(THEME.border_inactive)
    };
    let block = Block::default()
        .title(Span::styled(
            history_title(app.history_file.as_deref()),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(border_style);
    let inner_h = area.height.saturating_sub(2) as usize;
    let start = app.history.scroll as usize;
    let mut lines: Vec<Line> = Vec::new();
    for (i, r) in app
        .history
        .entries
        .iter()
        .enumerate()
        .skip(start)
        .take(inner_h)
    {
        let when = r.visited_at.format("%d %b %H:%M").to_string();
        let text = history_row(r.index, &r.address, &when);
        let style = if i == app.history.selected {
            if focused {
                Style::default()
                    .fg(THEME.history_selected_fg)
                    .bg(THEME.history_selected_bg)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
                    .fg(THEME.border_focus)
                    .add_modifier(Modifier::BOLD)
            }
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(text, style)));
    }
    let para = Paragraph::new(lines).block(block);
    f.render_widget(para, area);

    let inner = Rect {
        x: area.x.saturating_add(1),
        y: area.y.saturating_add(1),
        width: area.width.saturating_sub(2),
        height: area.height.saturating_sub(2),
    };
    let total = app.history.entries.len();
    if total > inner.height as usize {
        let mut sb_state = ScrollbarState::new(total).position(start);
        let sb = Scrollbar::default().orientation(ScrollbarOrientation::VerticalRight);
        f.render_stateful_widget(sb, inner, &mut sb_state);
    }
}

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
    let focus = match app.focus {
        Focus::Address => "Address",
        Focus::History => "History",
    };
    let col = cursor_column(app.editor().buffer(), app.editor().cursor()) as usize + 1;
    let tips = build_status_line(
        focus,
        col,
        app.history_len(),
        app.incognito(),
        app.status.as_deref(),
        area.width,
    );
    let style = if app.status.is_some() {
        Style::default().fg(THEME.warning_fg)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    f.render_widget(Paragraph::new(Line::from(Span::styled(tips, style))), area);
}

fn draw_address(f: &mut Frame, area: Rect, app: &App) {
    let focused = matches!(app.focus, Focus::Address);
    let border_style = if focused {
        Style::default().fg(THEME.border_focus)
    } else {
        Style::default().fg(THEME.border_inactive)
    };
    let block = Block::default()
        .title(TITLE_ADDRESS)
        .borders(Borders::ALL)
        .border_style(border_style);
    let inner_width = area.width.saturating_sub(2);
    let buffer = app.editor().buffer();
    let col = cursor_column(buffer, app.editor().cursor());
    let offset_x = horizontal_scroll(col, inner_width);

    let para = if buffer.is_empty() {
        Paragraph::new(Line::from(Span::styled(
            ADDRESS_HINT,
            Style::default().fg(Color::DarkGray),
        )))
        .block(block)
    } else {
        Paragraph::new(buffer.to_string())
            .block(block)
            .scroll((0, offset_x))
    };
    f.render_widget(para, area);

    if focused && !app.show_help && app.confirm.is_none() {
        let cursor_x = area.x + 1 + col.saturating_sub(offset_x);
        f.set_cursor_position(Position::new(cursor_x, area.y + 1));
    }
}

fn draw_help(f: &mut Frame, area: Rect) {
    let popup_area = centered_rect(70, 60, area);
    let block = Block::default()
        .title(Span::styled(
            TITLE_HELP,
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL);
    let lines = help_lines_ascii()
        .iter()
        .map(|s| Line::from(*s))
        .collect::<Vec<Line>>();
    let para = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(Clear, popup_area);
    f.render_widget(para, popup_area);
}

fn draw_confirm(f: &mut Frame, area: Rect, action: ConfirmAction) {
    let popup_area = centered_rect(60, 30, area);
    let block = Block::default()
        .title(Span::styled(
            TITLE_CONFIRM,
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL);
    let message = match action {
        ConfirmAction::ClearHistory => CONFIRM_CLEAR_HISTORY,
    };
    let para = Paragraph::new(Line::from(message))
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(Clear, popup_area);
    f.render_widget(para, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vert[1]);
    horiz[1]
}

// Display width of the first `cursor` graphemes.
fn cursor_column(buffer: &str, cursor: usize) -> u16 {
    buffer
        .graphemes(true)
        .take(cursor)
        .map(|g| g.width())
        .sum::<usize>()
        .min(u16::MAX as usize) as u16
}

// Columns to skip so the cursor cell stays inside a line of `width` cells.
fn horizontal_scroll(col: u16, width: u16) -> u16 {
    if width == 0 {
        return 0;
    }
    col.saturating_add(1).saturating_sub(width)
}
