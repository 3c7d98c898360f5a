use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, List, ListItem, ListState, Scrollbar, ScrollbarOrientation, ScrollbarState, StatefulWidget,
};
use ratatui::Frame;
use crate::models::PostWithTags;
use crate::Config;
use crate::tui::widgets::color::{get_contrast_text_color, parse_color};
use crate::tui::widgets::tags::format_tags_brackets;
use crate::tui::widgets::truncate_with_ellipsis;

const LINES_PER_POST: usize = 2;

/// Sidebar list: title on the first line, tags (or "[Untagged]") on the second
pub fn render_post_list(
    f: &mut Frame,
    area: Rect,
    posts: &[PostWithTags],
    total_count: usize,
    list_state: &mut ListState,
    config: &Config,
) {
    let max_width = area.width.saturating_sub(4) as usize; // borders + scrollbar + padding

    let theme = config.get_active_theme();
    let fg_color = parse_color(&theme.fg);
    let tag_color = parse_color(&theme.tag_fg);
    let highlight_bg = parse_color(&theme.highlight_bg);
    let highlight_fg = if theme.highlight_fg.is_empty() {
        get_contrast_text_color(highlight_bg)
    } else {
        parse_color(&theme.highlight_fg)
    };

    let items: Vec<ListItem> = posts
        .iter()
        .map(|post| {
            let title = truncate_with_ellipsis(&post.post.title, max_width);
            let tags = if post.tags.is_empty() {
                "  [Untagged]".to_string()
            } else {
                format!("  {}", format_tags_brackets(&post.tags))
            };
            ListItem::new(vec![
                Line::from(title),
                Line::from(Span::styled(truncate_with_ellipsis(&tags, max_width), Style::default().fg(tag_color))),
            ])
        })
        .collect();

    let [list_area, scrollbar_area] = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .areas(area);

    let title = format!("Posts ({} of {})", posts.len(), total_count);
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .style(Style::default().fg(fg_color))
        .highlight_style(Style::default().fg(highlight_fg).bg(highlight_bg));

    StatefulWidget::render(list, list_area, f.buffer_mut(), list_state);

    let visible_posts = list_area.height.saturating_sub(2) as usize / LINES_PER_POST;
    if posts.len() > visible_posts && visible_posts > 0 && scrollbar_area.width > 0 {
        let track = Rect::new(
            scrollbar_area.x,
            list_area.y + 1,
            scrollbar_area.width,
            list_area.height.saturating_sub(2),
        );
        let selected = list_state.selected().unwrap_or(0);
        let mut scrollbar_state = ScrollbarState::new(posts.len())
            .viewport_content_length(visible_posts)
            .position(selected.saturating_sub(visible_posts - 1));

        let scrollbar = Scrollbar::default()
            .orientation(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓"))
            .track_symbol(Some("│"))
            .thumb_symbol("█");
        f.render_stateful_widget(scrollbar, track, &mut scrollbar_state);
    }
}
