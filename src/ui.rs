use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::api::PromptKind;
use crate::app::App;
use crate::chat::{ChatEntry, ChatFocus, QuickReplyPanel};
use crate::input::TextInput;
use crate::prompt_form::FormField;

const SPINNER: [&str; 3] = ["◐", "◓", "◑"];

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_form(app, frame, body_area);
    render_footer(app, frame, footer_area);

    if app.chat.is_open() {
        render_chat(app, frame, body_area);
    }
    if app.notice.is_some() {
        render_notice(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Prompt Studio ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(app.base_url.clone(), Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let hints = if app.chat.is_open() {
        " Enter: send | Tab: suggestions | PgUp/PgDn: scroll | Esc: close chat "
    } else {
        " Enter: generate | Ctrl-S: short | Ctrl-Y: copy | Tab: field | F2: chat | Esc: quit "
    };
    let mode = if app.chat.is_open() { " CHAT " } else { " FORM " };
    let footer = Line::from(vec![
        Span::styled(mode, Style::default().bg(Color::Blue).fg(Color::White)),
        Span::styled(hints, Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(footer), area);
}

/// Draw a text field and place the cursor when focused
fn render_input(
    frame: &mut Frame,
    area: Rect,
    input: &TextInput,
    title: &str,
    focused: bool,
) {
    let border_color = if focused { Color::Yellow } else { Color::DarkGray };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title.to_string());

    let (visible_text, cursor_x) =
        input_viewport(input.value(), input.cursor(), area.width.saturating_sub(2) as usize);

    let widget = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(block);
    frame.render_widget(widget, area);

    if focused {
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

/// Horizontal scroll for a single-line field, measured in display columns.
/// Returns the visible text and the cursor column inside it.
fn input_viewport(value: &str, cursor: usize, width: usize) -> (String, u16) {
    let chars: Vec<char> = value.chars().collect();
    let cursor = cursor.min(chars.len());
    let col = |c: &char| c.width().unwrap_or(0);

    // Drop chars from the left until the cursor fits
    let mut start = 0;
    while start < cursor && chars[start..cursor].iter().map(col).sum::<usize>() >= width {
        start += 1;
    }

    let mut used = 0;
    let visible: String = chars[start..]
        .iter()
        .take_while(|c| {
            used += col(*c);
            used <= width
        })
        .collect();
    let cursor_x = chars[start..cursor].iter().map(col).sum::<usize>();
    (visible, cursor_x as u16)
}

fn render_form(app: &App, frame: &mut Frame, area: Rect) {
    let [task_area, provider_area, buttons_area, result_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(1),
        Constraint::Min(0),
    ])
    .areas(area);

    let form = &app.form;
    let form_active = !app.chat.is_open() && app.notice.is_none();

    render_input(
        frame,
        task_area,
        &form.task,
        " Task description ",
        form_active && form.focus == FormField::Task,
    );

    let provider_focused = form_active && form.focus == FormField::Provider;
    let provider_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if provider_focused {
            Color::Yellow
        } else {
            Color::DarkGray
        }))
        .title(" Provider (←/→) ");
    let provider = Paragraph::new(Line::from(vec![
        Span::styled("◀ ", Style::default().fg(Color::DarkGray)),
        Span::styled(form.provider.display_name(), Style::default().fg(Color::Magenta).bold()),
        Span::styled(" ▶", Style::default().fg(Color::DarkGray)),
    ]))
    .block(provider_block);
    frame.render_widget(provider, provider_area);

    let mut buttons = Vec::new();
    for (kind, key) in [(PromptKind::Full, "Enter"), (PromptKind::Short, "Ctrl-S")] {
        let state = form.button(kind);
        let style = if state.dimmed {
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM)
        } else {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        };
        buttons.push(Span::styled(format!(" {} ({}) ", kind.label(), key), style));
        buttons.push(Span::raw("  "));
    }
    buttons.push(Span::styled(
        " Copy (Ctrl-Y) ",
        Style::default().fg(Color::Black).bg(Color::Green),
    ));
    if form.spinner_visible() {
        let frame_idx = app.animation_frame as usize % SPINNER.len();
        buttons.push(Span::styled(
            format!("  {} Generating...", SPINNER[frame_idx]),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(buttons)), buttons_area);

    let result_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Result ");
    let result_text = if form.result_visible() {
        Text::from(form.result().to_string())
    } else {
        Text::from(Span::styled(
            "Describe a task and generate a prompt...",
            Style::default().fg(Color::DarkGray),
        ))
    };
    let result = Paragraph::new(result_text)
        .block(result_block)
        .wrap(Wrap { trim: false });
    frame.render_widget(result, result_area);
}

fn quick_reply_line(panel: &QuickReplyPanel, selected: usize, focused: bool) -> Line<'static> {
    let mut spans = Vec::new();
    for (i, reply) in panel.replies.iter().enumerate() {
        let style = if focused && i == selected {
            Style::default().fg(Color::Black).bg(Color::Magenta).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Magenta)
        };
        spans.push(Span::styled(format!("[ {} ]", reply.label), style));
        spans.push(Span::raw(" "));
    }
    Line::from(spans)
}

fn chat_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();
    for entry in app.chat.log() {
        match entry {
            ChatEntry::User(text) => {
                lines.push(Line::from(Span::styled(
                    "You:",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
                lines.push(Line::from(text.clone()));
            }
            ChatEntry::Bot(message) => {
                lines.push(Line::from(Span::styled(
                    "Vani:",
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));
                lines.extend(message.lines.iter().cloned());
            }
            ChatEntry::Typing => {
                // Animated ellipsis: cycles through ".", "..", "..."
                let dots = ".".repeat((app.animation_frame as usize) + 1);
                lines.push(Line::from(Span::styled(
                    format!("Vani is typing{}", dots),
                    Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
                )));
            }
            ChatEntry::QuickReplies(panel) => {
                let focused = app.chat.focus == ChatFocus::Suggestions;
                lines.push(quick_reply_line(panel, app.chat.selected_reply(), focused));
            }
        }
        lines.push(Line::default());
    }
    lines
}

/// Split text into alternating runs of whitespace and non-whitespace
fn split_words(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut prev_space = None;
    for (i, c) in text.char_indices() {
        let space = c.is_whitespace();
        if prev_space.is_some_and(|p| p != space) {
            tokens.push(&text[start..i]);
            start = i;
        }
        prev_space = Some(space);
    }
    if start < text.len() {
        tokens.push(&text[start..]);
    }
    tokens
}

/// Word-wrap a styled line to `width` columns, keeping span styles.
/// Words wider than a row are broken at the column limit.
fn wrap_line(line: &Line<'static>, width: usize) -> Vec<Line<'static>> {
    let width = width.max(1);
    let mut rows: Vec<Line<'static>> = Vec::new();
    let mut row: Vec<Span<'static>> = Vec::new();
    let mut row_width = 0;

    // Ends a wrapped row, dropping the whitespace it broke on
    let flush = |rows: &mut Vec<Line<'static>>, row: &mut Vec<Span<'static>>| {
        while row.last().is_some_and(|s| s.content.trim().is_empty()) {
            row.pop();
        }
        rows.push(Line::from(std::mem::take(row)).style(line.style));
    };

    for span in &line.spans {
        for token in split_words(&span.content) {
            let token_width = token.width();
            if token.starts_with(char::is_whitespace) {
                // Continuation rows don't start with the space that broke them
                if row_width == 0 && !rows.is_empty() {
                    continue;
                }
                if row_width + token_width > width {
                    flush(&mut rows, &mut row);
                    row_width = 0;
                    continue;
                }
                row.push(Span::styled(token.to_string(), span.style));
                row_width += token_width;
            } else if row_width + token_width <= width {
                row.push(Span::styled(token.to_string(), span.style));
                row_width += token_width;
            } else if token_width <= width {
                flush(&mut rows, &mut row);
                row.push(Span::styled(token.to_string(), span.style));
                row_width = token_width;
            } else {
                let mut piece = String::new();
                for c in token.chars() {
                    let w = c.width().unwrap_or(0);
                    if row_width + w > width && row_width > 0 {
                        if !piece.is_empty() {
                            row.push(Span::styled(std::mem::take(&mut piece), span.style));
                        }
                        flush(&mut rows, &mut row);
                        row_width = 0;
                    }
                    piece.push(c);
                    row_width += w;
                }
                if !piece.is_empty() {
                    row.push(Span::styled(piece, span.style));
                }
            }
        }
    }

    if !row.is_empty() || rows.is_empty() {
        rows.push(Line::from(row).style(line.style));
    }
    rows
}

fn popup_area(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let [area] = Layout::vertical([Constraint::Percentage(percent_y)])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::horizontal([Constraint::Percentage(percent_x)])
        .flex(Flex::Center)
        .areas(area);
    area
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let popup = popup_area(area, 70, 85);
    frame.render_widget(Clear, popup);

    let [log_area, input_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(3)]).areas(popup);

    let inner_height = log_area.height.saturating_sub(2);
    let inner_width = log_area.width.saturating_sub(2) as usize;
    let lines: Vec<Line<'static>> = chat_lines(app)
        .iter()
        .flat_map(|line| wrap_line(line, inner_width))
        .collect();
    let max_scroll = u16::try_from(lines.len())
        .unwrap_or(u16::MAX)
        .saturating_sub(inner_height);
    let scroll = app.chat.scroll().unwrap_or(max_scroll).min(max_scroll);
    app.chat_scroll = scroll;
    app.chat_max_scroll = max_scroll;

    let log_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Chat with Vani (Esc to close) ");
    // Lines are already wrapped to the inner width
    let log = Paragraph::new(Text::from(lines))
        .block(log_block)
        .scroll((scroll, 0));
    frame.render_widget(log, log_area);

    let focused = app.notice.is_none() && app.chat.focus == ChatFocus::Input;
    let title = if app.chat.is_waiting() {
        " Message (waiting for reply) "
    } else {
        " Message "
    };
    render_input(frame, input_area, &app.chat.input, title, focused);
}

fn render_notice(app: &App, frame: &mut Frame, area: Rect) {
    let Some(notice) = &app.notice else {
        return;
    };
    let width = (notice.body.chars().count() as u16 + 6).clamp(30, area.width);
    let [popup] = Layout::vertical([Constraint::Length(5)])
        .flex(Flex::Center)
        .areas(area);
    let [popup] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(popup);

    frame.render_widget(Clear, popup);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(format!(" {} ", notice.title));
    let body = Text::from(vec![
        Line::from(notice.body.clone()).bold(),
        Line::from(Span::styled(
            "press any key",
            Style::default().fg(Color::DarkGray),
        )),
    ]);
    frame.render_widget(Paragraph::new(body).centered().block(block), popup);
}
