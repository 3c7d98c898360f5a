use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};
use ratatui::Frame;
use crate::Config;
use crate::tui::app::{FilterFormField, FilterFormState};
use crate::tui::widgets::color::{get_contrast_text_color, parse_color};
use crate::tui::widgets::popup_area;

const ANY_TAG_LABEL: &str = "(any)";
const ACTIONS: [(&str, FilterFormField); 3] = [
    ("Apply", FilterFormField::Apply),
    ("Clear", FilterFormField::Clear),
    ("Cancel", FilterFormField::Cancel),
];

struct Palette {
    normal: Style,
    active: Style,
    selected: Style,
}

impl Palette {
    fn for_field(&self, active: bool) -> Style {
        if active { self.active } else { self.normal }
    }
}

fn field_title(label: &str, active: bool) -> String {
    format!("{} {}", if active { ">" } else { " " }, label)
}

/// Popup with a keyword field, a single-choice tag list and the action buttons
pub fn render_filter_modal(f: &mut Frame, area: Rect, state: &mut FilterFormState, config: &Config) {
    let theme = config.get_active_theme();
    let fg_color = parse_color(&theme.fg);
    let bg_color = parse_color(&theme.bg);
    let highlight_bg = parse_color(&theme.highlight_bg);
    let highlight_fg: Color = get_contrast_text_color(highlight_bg);
    let palette = Palette {
        normal: Style::default().fg(fg_color).bg(bg_color),
        active: Style::default().fg(highlight_fg).bg(highlight_bg),
        selected: Style::default().fg(highlight_fg).bg(highlight_bg).add_modifier(Modifier::BOLD),
    };

    let popup = popup_area(area, 70, 70);
    f.render_widget(Clear, popup);
    let outer = Block::default()
        .borders(Borders::ALL)
        .title("Filters")
        .title_alignment(Alignment::Center)
        .style(palette.normal);
    let inner = outer.inner(popup);
    f.render_widget(outer, popup);

    let [keyword_area, tag_area, actions_area] = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3), Constraint::Length(5)])
        .areas(inner);

    render_keyword_field(f, keyword_area, state, &palette);
    render_tag_selector(f, tag_area, state, &palette);
    render_actions(f, actions_area, state.current_field, &palette);
}

fn render_keyword_field(f: &mut Frame, area: Rect, state: &mut FilterFormState, palette: &Palette) {
    let active = state.current_field == FilterFormField::Keyword;
    state.keyword.update_horizontal_scroll(area.width as usize);
    let (_, visible) = state.keyword.get_visible_lines(1, area.width as usize);

    let paragraph = Paragraph::new(visible.into_iter().next().unwrap_or_default())
        .block(Block::default()
            .borders(Borders::ALL)
            .title(field_title("Keyword (title or description):", active))
            .style(palette.for_field(active)))
        .style(palette.normal);
    f.render_widget(paragraph, area);

    if active {
        if let Some(position) = state.keyword.get_cursor_screen_pos(area, 1) {
            f.set_cursor_position(position);
        }
    }
}

fn render_tag_selector(f: &mut Frame, area: Rect, state: &FilterFormState, palette: &Palette) {
    let active = state.current_field == FilterFormField::Tag;
    let items: Vec<ListItem> = std::iter::once(ANY_TAG_LABEL)
        .chain(state.tag_options.iter().map(String::as_str))
        .enumerate()
        .map(|(index, name)| {
            let radio = if index == state.tag_index { "●" } else { "○" };
            ListItem::new(format!("{} {}", radio, name))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .borders(Borders::ALL)
            .title(field_title("Tag:", active))
            .style(palette.for_field(active)))
        .style(palette.normal)
        .highlight_style(palette.selected);

    let mut list_state = ListState::default();
    list_state.select(Some(state.tag_index));
    f.render_stateful_widget(list, area, &mut list_state);
}

fn render_actions(f: &mut Frame, area: Rect, current: FilterFormField, palette: &Palette) {
    let mut any_active = false;
    let lines: Vec<Line> = ACTIONS
        .iter()
        .map(|(label, field)| {
            let active = *field == current;
            any_active |= active;
            let prefix = if active { "> " } else { "  " };
            Line::from(Span::styled(format!("{}{}", prefix, label), palette.for_field(active)))
        })
        .collect();

    let paragraph = Paragraph::new(lines)
        .block(Block::default()
            .borders(Borders::ALL)
            .title(field_title("Actions", any_active))
            .style(palette.for_field(any_active)))
        .style(palette.normal)
        .alignment(Alignment::Center);
    f.render_widget(paragraph, area);
}
