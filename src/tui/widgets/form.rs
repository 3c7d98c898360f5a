use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState};
use ratatui::Frame;
use crate::models::{DESCRIPTION_MAX_CHARS, TITLE_MAX_CHARS};
use crate::Config;
use crate::tui::app::{PostField, PostFormState};
use crate::tui::widgets::color::{get_contrast_text_color, parse_color};
use crate::tui::widgets::editor::Editor;

struct FieldStyles {
    active: Style,
    inactive: Style,
    error: Style,
}

/// Block title for a field: label, optional counter and any inline errors
fn field_title(label: &str, counter: Option<(usize, usize)>, errors: &[String], styles: &FieldStyles) -> Line<'static> {
    let mut spans = vec![Span::raw(label.to_string())];
    if let Some((used, max)) = counter {
        spans.push(Span::raw(format!(" ({}/{})", used, max)));
    }
    if !errors.is_empty() {
        spans.push(Span::styled(format!(" - {}", errors.join(", ")), styles.error));
    }
    Line::from(spans)
}

fn char_count(editor: &Editor) -> usize {
    editor.text().chars().count()
}

fn field_layout(area: Rect) -> [Rect; 3] {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(5),    // Description
            Constraint::Length(3), // Tags
        ])
        .areas(area)
}

fn render_single_line(
    f: &mut Frame,
    area: Rect,
    editor: &mut Editor,
    title: Line<'static>,
    active: bool,
    styles: &FieldStyles,
) {
    editor.update_horizontal_scroll(area.width as usize);
    let (_, visible) = editor.get_visible_lines(1, area.width as usize);
    let style = if active { styles.active } else { styles.inactive };
    let paragraph = Paragraph::new(visible.into_iter().next().unwrap_or_default())
        .style(style)
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(paragraph, area);

    if active {
        if let Some(position) = editor.get_cursor_screen_pos(area, 1) {
            f.set_cursor_position(position);
        }
    }
}

fn render_description(
    f: &mut Frame,
    area: Rect,
    editor: &mut Editor,
    title: Line<'static>,
    active: bool,
    styles: &FieldStyles,
) {
    let viewport_height = area.height.saturating_sub(2) as usize;
    let needs_scrollbar = editor.lines.len() > viewport_height;
    let (text_area, scrollbar_area) = if needs_scrollbar {
        let [text, bar] = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .areas(area);
        (text, Some(bar))
    } else {
        (area, None)
    };

    editor.update_scroll(viewport_height);
    editor.update_horizontal_scroll(text_area.width as usize);
    let (_, visible) = editor.get_visible_lines(viewport_height, text_area.width as usize);
    let style = if active { styles.active } else { styles.inactive };
    let paragraph = Paragraph::new(visible.into_iter().map(Line::from).collect::<Vec<_>>())
        .style(style)
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(paragraph, text_area);

    if let Some(bar) = scrollbar_area {
        let track = Rect::new(bar.x, text_area.y + 1, bar.width, text_area.height.saturating_sub(2));
        let mut state = ScrollbarState::new(editor.lines.len())
            .viewport_content_length(viewport_height)
            .position(editor.scroll_offset);
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓"))
            .track_symbol(Some("│"))
            .thumb_symbol("█");
        f.render_stateful_widget(scrollbar, track, &mut state);
    }

    if active {
        if let Some(position) = editor.get_cursor_screen_pos(text_area, viewport_height) {
            f.set_cursor_position(position);
        }
    }
}

/// Title, description and comma-separated tags, with validation errors
/// shown in the field borders
pub fn render_post_form(f: &mut Frame, area: Rect, form: &mut PostFormState, config: &Config) {
    if area.width < 2 || area.height < 2 {
        return;
    }

    let theme = config.get_active_theme();
    let highlight_bg = parse_color(&theme.highlight_bg);
    let highlight_fg = if theme.highlight_fg.is_empty() {
        get_contrast_text_color(highlight_bg)
    } else {
        parse_color(&theme.highlight_fg)
    };
    let styles = FieldStyles {
        active: Style::default().fg(highlight_fg).bg(highlight_bg),
        inactive: Style::default().fg(parse_color(&theme.fg)).add_modifier(Modifier::DIM),
        error: Style::default().fg(parse_color(&theme.error_fg)).add_modifier(Modifier::BOLD),
    };

    let [title_area, description_area, tags_area] = field_layout(area);
    let current = form.current_field;

    let title = field_title(
        "Title",
        Some((char_count(&form.title), TITLE_MAX_CHARS)),
        &form.errors_for(PostField::Title),
        &styles,
    );
    render_single_line(f, title_area, &mut form.title, title, current == PostField::Title, &styles);

    let title = field_title(
        "Description",
        Some((char_count(&form.description), DESCRIPTION_MAX_CHARS)),
        &form.errors_for(PostField::Description),
        &styles,
    );
    render_description(f, description_area, &mut form.description, title, current == PostField::Description, &styles);

    let title = field_title("Tags (comma-separated)", None, &form.errors_for(PostField::Tags), &styles);
    render_single_line(f, tags_area, &mut form.tags, title, current == PostField::Tags, &styles);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn styles() -> FieldStyles {
        FieldStyles {
            active: Style::default(),
            inactive: Style::default(),
            error: Style::default(),
        }
    }

    fn plain(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn title_shows_counter_and_errors() {
        let errors = vec!["can't be blank".to_string()];
        let line = field_title("Title", Some((0, 255)), &errors, &styles());
        assert_eq!(plain(&line), "Title (0/255) - can't be blank");
    }

    #[test]
    fn description_gets_remaining_height() {
        let [title, description, tags] = field_layout(Rect::new(0, 0, 40, 20));
        assert_eq!((title.height, description.height, tags.height), (3, 14, 3));
    }
}
