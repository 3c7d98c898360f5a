use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, size as terminal_size, EnterAlternateScreen, LeaveAlternateScreen};
use log::{debug, warn};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::Terminal;
use std::io;
use std::time::Duration;
use crate::tui::app::{FilterFormField, Mode, SidebarState};
use crate::tui::error::TuiError;
use crate::tui::layout::Layout;
use crate::tui::widgets::editor::Editor;
use crate::tui::App;
use crate::utils::{has_primary_modifier, parse_key_binding, ParsedKeyBinding};

/// Restores the terminal when dropped, including on panic
struct TerminalGuard {
    raw_mode_enabled: bool,
    alternate_screen_enabled: bool,
}

impl TerminalGuard {
    fn new() -> Result<Self, TuiError> {
        enable_raw_mode()?;
        let mut guard = Self {
            raw_mode_enabled: true,
            alternate_screen_enabled: false,
        };
        execute!(io::stdout(), EnterAlternateScreen)?;
        guard.alternate_screen_enabled = true;
        Ok(guard)
    }

    /// Restore explicitly on normal exit; the drop becomes a no-op
    fn restore(&mut self) -> Result<(), TuiError> {
        if self.raw_mode_enabled {
            disable_raw_mode()?;
            self.raw_mode_enabled = false;
        }
        if self.alternate_screen_enabled {
            execute!(io::stdout(), LeaveAlternateScreen)?;
            self.alternate_screen_enabled = false;
        }
        Ok(())
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if self.raw_mode_enabled {
            let _ = disable_raw_mode();
        }
        if self.alternate_screen_enabled {
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
        }
    }
}

pub fn run_event_loop(mut app: App) -> Result<(), TuiError> {
    // Checked before entering the alternate screen so the error stays visible
    let (width, height) = terminal_size()?;
    let min_width = Layout::MIN_WIDTH + 2;
    let min_height = Layout::MIN_HEIGHT + 2;
    if width < min_width || height < min_height {
        return Err(TuiError::TerminalTooSmall { width, height, min_width, min_height });
    }

    let mut guard = TerminalGuard::new()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
    debug!("entered TUI at {}x{}", width, height);

    loop {
        app.check_status_message_timeout();

        let size = terminal.size()?;
        let layout = Layout::calculate(
            Rect::new(0, 0, size.width, size.height),
            app.config.sidebar_width_percent,
            app.ui.sidebar_state == SidebarState::Collapsed,
        );
        let page_height = layout.main_area.height.saturating_sub(2) as usize;

        terminal.draw(|f| crate::tui::render::render(f, &mut app, &layout))?;

        if event::poll(Duration::from_millis(16))? {
            // Release events would double every keystroke on Windows
            if let Event::Key(key_event) = event::read()? {
                if key_event.kind == KeyEventKind::Press && handle_key_event(&mut app, key_event, page_height)? {
                    break;
                }
            }
        }
    }

    guard.restore()?;
    debug!("left TUI");
    Ok(())
}

fn matches_key_event(key_event: KeyEvent, binding: &ParsedKeyBinding) -> bool {
    binding.requires_ctrl == has_primary_modifier(key_event.modifiers) && binding.key_code == key_event.code
}

fn binding_matches(key_event: KeyEvent, action: &'static str, binding: &str) -> Result<bool, TuiError> {
    let parsed = parse_key_binding(binding).map_err(|message| TuiError::KeyBindingError { action, message })?;
    Ok(matches_key_event(key_event, &parsed))
}

/// Returns true when the app should quit
pub fn handle_key_event(app: &mut App, key_event: KeyEvent, page_height: usize) -> Result<bool, TuiError> {
    if app.modals.delete_confirmation.is_some() {
        return handle_delete_confirmation_modal(app, key_event);
    }

    match app.ui.mode {
        Mode::Form => handle_form_mode(app, key_event),
        Mode::Help => handle_help_mode(app, key_event),
        Mode::Search => handle_search_mode(app, key_event),
        Mode::Filter => handle_filter_mode(app, key_event),
        Mode::View => handle_global_key_bindings(app, key_event, page_height),
    }
}

fn handle_delete_confirmation_modal(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    match key_event.code {
        KeyCode::Up | KeyCode::Down | KeyCode::Tab | KeyCode::BackTab => app.toggle_delete_selection(),
        KeyCode::Enter => {
            if let Err(e) = app.confirm_delete() {
                warn!("delete failed: {}", e);
                app.set_status_message(format!("Failed to delete post: {}", e));
            }
        }
        KeyCode::Esc => app.cancel_delete(),
        _ => {}
    }
    Ok(false)
}

fn handle_help_mode(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    let kb = &app.config.key_bindings;
    if key_event.code == KeyCode::Esc
        || binding_matches(key_event, "help", &kb.help)?
        || binding_matches(key_event, "quit", &kb.quit)?
    {
        app.exit_help_mode();
    }
    Ok(false)
}

fn handle_search_mode(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    match key_event.code {
        KeyCode::Esc => app.cancel_search(),
        KeyCode::Enter => app.submit_search(),
        KeyCode::Backspace => app.remove_from_search(),
        KeyCode::Char(c) if !has_primary_modifier(key_event.modifiers) => app.add_to_search(c),
        _ => {}
    }
    Ok(false)
}

/// Cursor movement and editing shared by every text field.
/// Enter is left to the caller since only the description is multi-line.
fn handle_editor_key(editor: &mut Editor, key_event: KeyEvent) -> bool {
    match key_event.code {
        KeyCode::Char(c) if !has_primary_modifier(key_event.modifiers) => editor.insert_char(c),
        KeyCode::Backspace => editor.delete_char(),
        KeyCode::Delete => editor.delete_forward(),
        KeyCode::Left => editor.move_cursor_left(),
        KeyCode::Right => editor.move_cursor_right(),
        KeyCode::Up => editor.move_cursor_up(),
        KeyCode::Down => editor.move_cursor_down(),
        KeyCode::Home => editor.move_cursor_home(),
        KeyCode::End => editor.move_cursor_end(),
        _ => return false,
    }
    true
}

fn is_save_key(app: &App, key_event: KeyEvent) -> Result<bool, TuiError> {
    let is_save = binding_matches(key_event, "save", &app.config.key_bindings.save)?;

    // Option+s can arrive as a composed character without the ALT modifier
    #[cfg(target_os = "macos")]
    {
        if !is_save {
            return Ok(matches!(key_event.code, KeyCode::Char('ś' | 'Ś' | 'ß')));
        }
    }

    Ok(is_save)
}

fn handle_form_mode(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    if is_save_key(app, key_event)? {
        if let Err(e) = app.save_form() {
            warn!("saving post failed: {}", e);
            app.set_status_message(format!("Failed to save post: {}", e));
        }
        return Ok(false);
    }

    match key_event.code {
        KeyCode::Esc => {
            app.exit_form_mode();
            app.set_status_message("Changes discarded".to_string());
        }
        KeyCode::Tab if !key_event.modifiers.contains(KeyModifiers::SHIFT) => app.navigate_form_field(true),
        KeyCode::Tab | KeyCode::BackTab => app.navigate_form_field(false),
        KeyCode::Enter => {
            if app.is_description_field_active() {
                if let Some(editor) = app.get_current_form_editor() {
                    editor.insert_newline();
                }
            } else {
                app.navigate_form_field(true);
            }
        }
        _ => {
            if let Some(editor) = app.get_current_form_editor() {
                handle_editor_key(editor, key_event);
            }
        }
    }
    Ok(false)
}

fn handle_filter_mode(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    let Some(current_field) = app.filter.form_state.as_ref().map(|s| s.current_field) else {
        app.exit_filter_mode();
        return Ok(false);
    };

    match key_event.code {
        KeyCode::Esc => app.exit_filter_mode(),
        KeyCode::Tab if !key_event.modifiers.contains(KeyModifiers::SHIFT) => app.navigate_filter_field(true),
        KeyCode::Tab | KeyCode::BackTab => app.navigate_filter_field(false),
        KeyCode::Enter => match current_field {
            FilterFormField::Apply => app.apply_filters(),
            FilterFormField::Clear => app.clear_filters(),
            FilterFormField::Cancel => app.exit_filter_mode(),
            // Enter in the fields applies straight away
            FilterFormField::Keyword | FilterFormField::Tag => app.apply_filters(),
        },
        KeyCode::Up if current_field == FilterFormField::Tag => app.move_filter_tag_up(),
        KeyCode::Down if current_field == FilterFormField::Tag => app.move_filter_tag_down(),
        _ => {
            if let Some(editor) = app.get_current_filter_editor() {
                handle_editor_key(editor, key_event);
            }
        }
    }
    Ok(false)
}

fn handle_global_key_bindings(app: &mut App, key_event: KeyEvent, page_height: usize) -> Result<bool, TuiError> {
    let kb = app.config.key_bindings.clone();

    if binding_matches(key_event, "quit", &kb.quit)? {
        return Ok(true);
    }
    if binding_matches(key_event, "help", &kb.help)? {
        app.enter_help_mode();
    } else if binding_matches(key_event, "toggle_sidebar", &kb.toggle_sidebar)? {
        app.toggle_sidebar();
    } else if binding_matches(key_event, "new", &kb.new)? {
        app.enter_create_mode();
    } else if binding_matches(key_event, "edit", &kb.edit)? || binding_matches(key_event, "select", &kb.select)? {
        app.enter_edit_mode();
    } else if binding_matches(key_event, "delete", &kb.delete)? {
        app.request_delete();
    } else if binding_matches(key_event, "search", &kb.search)? {
        app.enter_search_mode();
    } else if binding_matches(key_event, "filter", &kb.filter)? {
        app.enter_filter_mode();
    } else if binding_matches(key_event, "list_up", &kb.list_up)? || key_event.code == KeyCode::Up {
        app.move_selection_up();
    } else if binding_matches(key_event, "list_down", &kb.list_down)? || key_event.code == KeyCode::Down {
        app.move_selection_down();
    } else {
        match key_event.code {
            KeyCode::PageUp => app.scroll_item_view_page_up(page_height),
            KeyCode::PageDown => app.scroll_item_view_page_down(page_height),
            KeyCode::Home => app.scroll_item_view_to_top(),
            KeyCode::Esc if !app.filter.query.is_unfiltered() => app.clear_filters(),
            _ => {}
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PostForm;
    use crate::{Config, Database};
    use pretty_assertions::assert_eq;

    fn app() -> App {
        let db = Database::in_memory().unwrap();
        db.create_post(&PostForm::new("Ruby basics", "Blocks").with_tags("Ruby")).unwrap();
        db.create_post(&PostForm::new("CSS grid", "Layouts").with_tags("CSS")).unwrap();
        App::new(Config::default(), db).unwrap()
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        handle_key_event(app, KeyEvent::new(code, KeyModifiers::NONE), 10).unwrap()
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn quit_binding_exits() {
        let mut app = app();
        assert!(!press(&mut app, KeyCode::Char('j')));
        assert!(press(&mut app, KeyCode::Char('q')));
    }

    #[test]
    fn new_post_through_the_form() {
        let mut app = app();
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.ui.mode, Mode::Form);

        type_text(&mut app, "Go tips");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "Line one");
        press(&mut app, KeyCode::Enter);
        type_text(&mut app, "Line two");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "Go, tips");
        handle_key_event(&mut app, KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL), 10).unwrap();

        assert_eq!(app.ui.mode, Mode::View);
        let post = app.selected_post().unwrap();
        assert_eq!(post.post.description, "Line one\nLine two");
        assert_eq!(post.tag_names(), vec!["Go", "tips"]);
    }

    #[test]
    fn escape_discards_the_form() {
        let mut app = app();
        press(&mut app, KeyCode::Char('e'));
        type_text(&mut app, "!!!");
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.ui.mode, Mode::View);
        assert_eq!(app.database.get_post(1).unwrap().post.title, "Ruby basics");
    }

    #[test]
    fn search_then_escape_clears_it() {
        let mut app = app();
        press(&mut app, KeyCode::Char('/'));
        type_text(&mut app, "grid");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.listing.posts.len(), 1);

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.listing.posts.len(), 2);
    }

    #[test]
    fn filter_modal_selects_a_tag() {
        let mut app = app();
        press(&mut app, KeyCode::Char('f'));
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Down); // CSS
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.ui.mode, Mode::View);
        assert_eq!(app.filter.query.tag.as_deref(), Some("CSS"));
        assert_eq!(app.listing.posts[0].post.title, "CSS grid");
    }

    #[test]
    fn delete_requires_confirmation() {
        let mut app = app();
        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.database.count_posts().unwrap(), 2);

        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Up);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.database.count_posts().unwrap(), 1);
        assert!(app.modals.delete_confirmation.is_none());
    }

    #[test]
    fn invalid_binding_is_reported() {
        let mut app = app();
        app.config.key_bindings.quit = "Hyper+q".to_string();
        let err = handle_key_event(&mut app, KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE), 10)
            .unwrap_err();
        assert!(matches!(err, TuiError::KeyBindingError { action: "quit", .. }));
    }
}
