//! Conversation renderer: turns in, styled lines out
//!
//! Pure display logic. Content is treated as lightweight markdown:
//! fenced code blocks keyed by their language tag, inline code, bold,
//! headers and bullets. Everything else passes through as plain text.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use regex::Regex;

use jarvis_core::session::{Turn, ERROR_MODEL};

/// Render an ordered turn slice into display lines
pub fn render_turns(turns: &[Turn]) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for turn in turns {
        lines.push(header_line(turn));
        lines.extend(content_lines(&turn.content));
        lines.push(Line::default());
    }
    lines
}

fn header_line(turn: &Turn) -> Line<'static> {
    let model_tag = if turn.model.is_empty() {
        String::new()
    } else {
        format!(" - {}", turn.model)
    };

    if turn.role == "user" {
        Line::from(vec![
            Span::styled(
                "you".to_string(),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(model_tag, Style::default().add_modifier(Modifier::ITALIC)),
        ])
    } else {
        let color = if turn.model == ERROR_MODEL {
            Color::Red
        } else {
            Color::Green
        };
        Line::from(vec![
            Span::styled(
                "jarvis".to_string(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
            Span::styled(model_tag, Style::default().add_modifier(Modifier::ITALIC)),
        ])
    }
}

/// Render message content. Fenced code blocks get the accent color of
/// their declared language; a fence without a tag falls back to the
/// undecorated inline-code style.
fn content_lines(content: &str) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut in_code = false;
    let mut code_style = inline_code_style();

    for raw in content.lines() {
        let trimmed = raw.trim_end();
        if let Some(rest) = trimmed.trim_start().strip_prefix("```") {
            if in_code {
                in_code = false;
            } else {
                in_code = true;
                code_style = fence_style(rest.trim());
            }
            continue;
        }

        if in_code {
            lines.push(Line::from(Span::styled(format!("  {}", raw), code_style)));
        } else {
            lines.push(prose_line(trimmed));
        }
    }

    // An unclosed fence still renders its collected lines
    lines
}

fn prose_line(line: &str) -> Line<'static> {
    // Headers # Title -> just the title, bold
    let header_re = Regex::new(r"^#{1,6}\s+(.+)$").unwrap();
    if let Some(caps) = header_re.captures(line) {
        return Line::from(Span::styled(
            caps[1].to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ));
    }

    // Bullet lists - item -> • item
    let bullet_re = Regex::new(r"^[-*]\s+").unwrap();
    let line = bullet_re.replace(line, "• ").to_string();

    Line::from(inline_spans(&line))
}

/// Split a prose line into spans: `code` segments first, then **bold**
/// inside the remainder.
fn inline_spans(line: &str) -> Vec<Span<'static>> {
    let inline_code_re = Regex::new(r"`([^`]+)`").unwrap();

    let mut spans = Vec::new();
    let mut last = 0;
    for caps in inline_code_re.captures_iter(line) {
        let matched = caps.get(0).expect("match group 0");
        spans.extend(bold_spans(&line[last..matched.start()]));
        spans.push(Span::styled(caps[1].to_string(), inline_code_style()));
        last = matched.end();
    }
    spans.extend(bold_spans(&line[last..]));
    spans
}

fn bold_spans(text: &str) -> Vec<Span<'static>> {
    let bold_re = Regex::new(r"\*\*(.+?)\*\*").unwrap();

    let mut spans = Vec::new();
    let mut last = 0;
    for caps in bold_re.captures_iter(text) {
        let matched = caps.get(0).expect("match group 0");
        let before = &text[last..matched.start()];
        if !before.is_empty() {
            spans.push(Span::raw(before.to_string()));
        }
        spans.push(Span::styled(
            caps[1].to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        last = matched.end();
    }
    let rest = &text[last..];
    if !rest.is_empty() {
        spans.push(Span::raw(rest.to_string()));
    }
    spans
}

fn inline_code_style() -> Style {
    Style::default().fg(Color::Gray)
}

/// Accent color for a fenced block, keyed by the declared language tag
fn fence_style(language: &str) -> Style {
    if language.is_empty() {
        return inline_code_style();
    }
    let color = match language {
        "rust" | "rs" => Color::LightRed,
        "python" | "py" => Color::LightBlue,
        "javascript" | "js" | "typescript" | "ts" => Color::LightYellow,
        "json" => Color::LightGreen,
        "bash" | "sh" | "shell" => Color::LightMagenta,
        _ => Color::White,
    };
    Style::default().fg(color)
}
