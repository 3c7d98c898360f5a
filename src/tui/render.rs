use ratatui::layout::Alignment;
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders};
use ratatui::Frame;
use crate::tui::app::{Mode, SidebarState};
use crate::tui::widgets::{
    color::parse_color,
    confirm_delete::render_confirm_delete,
    filter_modal::render_filter_modal,
    filters_box::{render_filters_box, render_search_prompt},
    form::render_post_form,
    help::render_help,
    item_view::{render_empty_view, render_item_view},
    post_list::render_post_list,
    status_bar::render_status_bar,
};
use crate::tui::{App, Layout};
use crate::utils::format_key_binding_for_display as key;

pub fn render(f: &mut Frame, app: &mut App, layout: &Layout) {
    let theme = app.config.get_active_theme();
    let outer_block = Block::default()
        .borders(Borders::ALL)
        .title("tagpost")
        .title_alignment(Alignment::Center)
        .style(Style::default().fg(parse_color(&theme.fg)).bg(parse_color(&theme.bg)));
    f.render_widget(outer_block, f.area());

    if app.ui.sidebar_state == SidebarState::Expanded && layout.sidebar_area.width > 0 {
        render_post_list(
            f,
            layout.sidebar_area,
            &app.listing.posts,
            app.total_posts,
            &mut app.ui.list_state,
            &app.config,
        );
    }

    // Overlays are drawn on top of the regular content below
    let empty = empty_message(app);
    match (app.ui.mode, app.form.post_form.as_mut()) {
        (Mode::Form, Some(form)) => render_post_form(f, layout.main_area, form, &app.config),
        _ => match app.listing.posts.get(app.ui.selected_index) {
            Some(post) => render_item_view(f, layout.main_area, post, &app.config, app.ui.item_view_scroll),
            None => render_empty_view(f, layout.main_area, empty, &app.config),
        },
    }

    if app.ui.mode == Mode::Search {
        render_search_prompt(f, layout.filters_area, &app.search.query, &app.config);
    } else {
        render_filters_box(f, layout.filters_area, &app.get_filter_summary(), &app.config);
    }

    if app.ui.mode == Mode::Help {
        render_help(f, f.area(), &app.config);
    }

    if app.ui.mode == Mode::Filter {
        if let Some(ref mut state) = app.filter.form_state {
            render_filter_modal(f, f.area(), state, &app.config);
        }
    }

    if let Some(ref post) = app.modals.delete_confirmation {
        render_confirm_delete(f, f.area(), post, app.modals.delete_modal_selection, &app.config);
    }

    let key_hints = get_key_hints(app);
    render_status_bar(f, layout.status_area, app.status.message.as_deref(), &key_hints, &app.config);
}

fn empty_message(app: &App) -> &'static str {
    if app.listing.is_filtered() {
        "No posts match the current search."
    } else if app.total_posts == 0 {
        "No posts yet."
    } else {
        "Select a post to view it"
    }
}

pub fn get_key_hints(app: &App) -> Vec<String> {
    let kb = &app.config.key_bindings;
    if app.modals.delete_confirmation.is_some() {
        return vec!["↑/↓: Choose".to_string(), "Enter: Confirm".to_string(), "Esc: Cancel".to_string()];
    }

    match app.ui.mode {
        Mode::Help => vec![format!("Esc or {}: Close help", key(&kb.help))],
        Mode::Search => vec!["Enter: Search".to_string(), "Esc: Cancel".to_string()],
        Mode::Form => vec![
            format!("{}: Save", key(&kb.save)),
            "Tab/Shift+Tab: Switch field".to_string(),
            "Esc: Cancel".to_string(),
        ],
        Mode::Filter => vec![
            "Tab/Shift+Tab: Switch field".to_string(),
            "↑/↓: Choose tag".to_string(),
            "Enter: Apply".to_string(),
            "Esc: Cancel".to_string(),
        ],
        Mode::View => {
            let mut hints = vec![
                format!("{}: Quit", key(&kb.quit)),
                format!("{}: New", key(&kb.new)),
                format!("{}: Edit", key(&kb.edit)),
                format!("{}: Delete", key(&kb.delete)),
                format!("{}: Search", key(&kb.search)),
                format!("{}: Filters", key(&kb.filter)),
            ];
            if !app.filter.query.is_unfiltered() {
                hints.push("Esc: Clear filters".to_string());
            }
            hints.push(format!("{}: Toggle sidebar", key(&kb.toggle_sidebar)));
            hints.push(format!("{}: Help", key(&kb.help)));
            hints
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PostForm;
    use crate::search::PostQuery;
    use crate::{Config, Database};
    use pretty_assertions::assert_eq;
    use ratatui::backend::TestBackend;
    use ratatui::layout::Rect;
    use ratatui::Terminal;

    fn app() -> App {
        let db = Database::in_memory().unwrap();
        db.create_post(&PostForm::new("Ruby basics", "Blocks and procs").with_tags("Ruby, Beginner"))
            .unwrap();
        App::new(Config::default(), db).unwrap()
    }

    fn draw(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        let layout = Layout::calculate(Rect::new(0, 0, 80, 24), app.config.sidebar_width_percent, false);
        terminal.draw(|f| render(f, app, &layout)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer.content().iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn renders_list_and_detail() {
        let mut app = app();
        let screen = draw(&mut app);
        assert!(screen.contains("Posts (1 of 1)"));
        assert!(screen.contains("[Ruby] [Beginner]"));
        assert!(screen.contains("All posts"));
    }

    #[test]
    fn empty_search_says_so() {
        let mut app = app();
        app.filter.query = PostQuery::default().with_keyword("nothing");
        app.load_data().unwrap();
        let screen = draw(&mut app);
        assert!(screen.contains("Posts (0 of 1)"));
        assert!(screen.contains("No posts match the current search."));
    }

    #[test]
    fn view_hints_offer_clearing_only_when_filtered() {
        let mut app = app();
        assert!(!get_key_hints(&app).contains(&"Esc: Clear filters".to_string()));
        app.filter.query = PostQuery::default().with_tag("Ruby");
        assert!(get_key_hints(&app).contains(&"Esc: Clear filters".to_string()));
        assert_eq!(get_key_hints(&app)[0], "q: Quit");
    }
}
