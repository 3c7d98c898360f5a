use ratatui::layout::{Constraint, Direction, Layout as RatLayout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap};
use ratatui::Frame;
use ratskin::RatSkin;
use termimad::minimad::Text as MinimadText;
use std::cmp;
use crate::models::PostWithTags;
use crate::Config;
use crate::tui::widgets::color::parse_color;
use crate::tui::widgets::tags::format_tags_brackets;

/// Markdown shown in the detail pane; the description is passed through as-is
pub fn get_content_string(post: &PostWithTags) -> String {
    let mut content = format!("# {}\n\n", post.post.title);
    if post.tags.is_empty() {
        content.push_str("**Tags:** *none*\n");
    } else {
        content.push_str(&format!("**Tags:** {}\n", format_tags_brackets(&post.tags)));
    }
    content.push_str(&format!("**Created:** {}\n", post.post.created_at));
    if post.post.updated_at != post.post.created_at {
        content.push_str(&format!("**Updated:** {}\n", post.post.updated_at));
    }
    content.push_str("\n---\n\n");
    content.push_str(&post.post.description);
    content.push('\n');
    content
}

/// Centered placeholder used when there is no post to show
pub fn render_empty_view(f: &mut Frame, area: Rect, message: &str, config: &Config) {
    let fg_color = parse_color(&config.get_active_theme().fg);
    let paragraph = Paragraph::new(message)
        .block(Block::default().borders(Borders::ALL).title("Post"))
        .style(Style::default().fg(fg_color))
        .alignment(ratatui::layout::Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

pub fn render_item_view(f: &mut Frame, area: Rect, post: &PostWithTags, config: &Config, scroll_offset: usize) {
    if area.width < 2 || area.height < 2 {
        return;
    }

    let [content_area, scrollbar_area] = RatLayout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .areas(area);

    let viewport_height = (area.height - 2) as usize;
    let text_width: u16 = content_area.width.saturating_sub(2);

    // ratskin wraps to the given width, so each parsed line is one screen row
    let content = get_content_string(post);
    let lines: Vec<Line> = RatSkin::default()
        .parse(MinimadText::from(content.as_str()), text_width)
        .into_iter()
        .map(|line| {
            Line::from(line.spans
                .into_iter()
                .map(|span| Span::styled(span.content.to_string(), span.style))
                .collect::<Vec<_>>())
        })
        .collect();

    let total_lines = lines.len();
    let scroll_offset = cmp::min(scroll_offset, total_lines.saturating_sub(viewport_height));
    let end_line = cmp::min(scroll_offset + viewport_height, total_lines);
    let visible = Text::from(lines[scroll_offset..end_line].to_vec());

    let title = format!("Post #{}", post.post.id);
    let paragraph = Paragraph::new(visible)
        .block(Block::default().borders(Borders::ALL).title(title))
        .style(Style::default().fg(parse_color(&config.get_active_theme().fg)))
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, content_area);

    if total_lines > viewport_height {
        let track = Rect::new(
            scrollbar_area.x,
            content_area.y + 1,
            scrollbar_area.width,
            content_area.height.saturating_sub(2),
        );
        let mut scrollbar_state = ScrollbarState::new(total_lines)
            .viewport_content_length(viewport_height)
            .position(scroll_offset);
        let scrollbar = Scrollbar::default()
            .orientation(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓"))
            .track_symbol(Some("│"))
            .thumb_symbol("█");
        f.render_stateful_widget(scrollbar, track, &mut scrollbar_state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Post, Tag};

    fn post(tags: &[&str], updated_at: &str) -> PostWithTags {
        PostWithTags {
            post: Post {
                id: 7,
                title: "Rails routing".to_string(),
                description: "Use `resources`.".to_string(),
                created_at: "2026-01-01 10:00:00".to_string(),
                updated_at: updated_at.to_string(),
            },
            tags: tags
                .iter()
                .enumerate()
                .map(|(i, name)| Tag {
                    id: i as i64 + 1,
                    name: name.to_string(),
                    created_at: String::new(),
                    updated_at: String::new(),
                })
                .collect(),
        }
    }

    #[test]
    fn content_lists_tags_in_brackets() {
        let content = get_content_string(&post(&["Ruby", "Rails"], "2026-01-01 10:00:00"));
        assert!(content.starts_with("# Rails routing\n\n**Tags:** [Ruby] [Rails]\n"));
        assert!(!content.contains("**Updated:**"));
        assert!(content.ends_with("---\n\nUse `resources`.\n"));
    }

    #[test]
    fn untagged_and_edited_posts() {
        let content = get_content_string(&post(&[], "2026-02-01 09:30:00"));
        assert!(content.contains("**Tags:** *none*\n"));
        assert!(content.contains("**Updated:** 2026-02-01 09:30:00\n"));
    }
}
