use ratatui::layout::{Alignment, Rect};
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;
use crate::Config;
use crate::utils::format_key_binding_for_display as key;
use crate::tui::widgets::color::parse_color;
use crate::tui::widgets::popup_area;

pub fn render_help(f: &mut Frame, area: Rect, config: &Config) {
    let theme = config.get_active_theme();
    let style = Style::default().fg(parse_color(&theme.fg)).bg(parse_color(&theme.bg));

    let popup = popup_area(area, 60, 70);
    f.render_widget(Clear, popup);

    let paragraph = Paragraph::new(build_help_text(config))
        .block(Block::default()
            .borders(Borders::ALL)
            .title("Help - Key Bindings")
            .title_alignment(Alignment::Center)
            .style(style))
        .style(style)
        .wrap(Wrap { trim: false });

    f.render_widget(paragraph, popup);
}

pub fn build_help_text(config: &Config) -> String {
    let kb = &config.key_bindings;
    let mut text = String::new();

    text.push_str("Posts:\n");
    text.push_str(&format!("  {} / {}: Move up/down\n", key(&kb.list_up), key(&kb.list_down)));
    text.push_str(&format!("  {}: New post\n", key(&kb.new)));
    text.push_str(&format!("  {} / {}: Edit selected post\n", key(&kb.edit), key(&kb.select)));
    text.push_str(&format!("  {}: Delete selected post\n", key(&kb.delete)));
    text.push_str("  PgUp / PgDn: Scroll post\n");
    text.push('\n');

    text.push_str("Search:\n");
    text.push_str(&format!("  {}: Search titles and descriptions\n", key(&kb.search)));
    text.push_str(&format!("  {}: Filter by keyword and tag\n", key(&kb.filter)));
    text.push_str("  Esc: Clear search and filters\n");
    text.push('\n');

    text.push_str("Post Form:\n");
    text.push_str(&format!("  {}: Save\n", key(&kb.save)));
    text.push_str("  Tab / Shift+Tab: Next/previous field\n");
    text.push_str("  Tags: comma-separated, e.g. Ruby, Rails\n");
    text.push_str("  Enter: New line (description only)\n");
    text.push_str("  Esc: Cancel\n");
    text.push('\n');

    text.push_str("General:\n");
    text.push_str(&format!("  {}: Toggle sidebar\n", key(&kb.toggle_sidebar)));
    text.push_str(&format!("  {}: Show/hide help\n", key(&kb.help)));
    text.push_str(&format!("  {}: Quit\n", key(&kb.quit)));

    text
}
