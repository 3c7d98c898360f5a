use ratatui::layout::{Position, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use crate::Config;
use crate::tui::widgets::color::parse_color;

/// Bottom box showing the active search criteria
pub fn render_filters_box(f: &mut Frame, area: Rect, summary: &str, config: &Config) {
    let theme = config.get_active_theme();
    let fg_color = parse_color(&theme.fg);
    let bg_color = parse_color(&theme.bg);

    let paragraph = Paragraph::new(summary)
        .block(Block::default()
            .borders(Borders::ALL)
            .title(format!("{}: Filters", config.key_bindings.filter))
            .style(Style::default().fg(fg_color).bg(bg_color)))
        .style(Style::default().fg(fg_color));

    f.render_widget(paragraph, area);
}

/// Same box while a keyword is being typed, with the terminal cursor at its end
pub fn render_search_prompt(f: &mut Frame, area: Rect, query: &str, config: &Config) {
    let theme = config.get_active_theme();
    let fg_color = parse_color(&theme.fg);
    let bg_color = parse_color(&theme.bg);
    let highlight = parse_color(&theme.highlight_bg);

    let prefix = "Search: ";
    let line = Line::from(vec![
        Span::styled(prefix, Style::default().fg(highlight)),
        Span::raw(query),
    ]);
    let paragraph = Paragraph::new(line).block(Block::default()
        .borders(Borders::ALL)
        .title("Enter: Search  Esc: Cancel")
        .border_style(Style::default().fg(highlight))
        .style(Style::default().fg(fg_color).bg(bg_color)));
    f.render_widget(paragraph, area);

    let cursor_x = area.x + 1 + (prefix.chars().count() + query.chars().count()) as u16;
    if cursor_x < area.x + area.width.saturating_sub(1) {
        f.set_cursor_position(Position::new(cursor_x, area.y + 1));
    }
}
