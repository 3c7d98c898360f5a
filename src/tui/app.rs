use crate::{Config, Database};
use crate::database::DatabaseError;
use crate::models::{PostForm, PostWithTags, ValidationErrors};
use crate::search::{PostListing, PostQuery};
use crate::tui::widgets::editor::Editor;
use log::{debug, warn};
use ratatui::widgets::ListState;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidebarState {
    Expanded,
    Collapsed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    View,
    Search,
    Help,
    Form,
    Filter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostField {
    Title,
    Description,
    Tags,
}

impl PostField {
    fn next(self, forward: bool) -> Self {
        match (self, forward) {
            (PostField::Title, true) => PostField::Description,
            (PostField::Description, true) => PostField::Tags,
            (PostField::Tags, true) => PostField::Title,
            (PostField::Title, false) => PostField::Tags,
            (PostField::Description, false) => PostField::Title,
            (PostField::Tags, false) => PostField::Description,
        }
    }
}

/// In-progress create or edit of a post
#[derive(Debug, Clone)]
pub struct PostFormState {
    pub current_field: PostField,
    pub title: Editor,
    pub description: Editor,
    pub tags: Editor,
    pub editing_post_id: Option<i64>, // None for new posts
    pub errors: ValidationErrors,
}

impl PostFormState {
    pub fn new_post() -> Self {
        Self {
            current_field: PostField::Title,
            title: Editor::new(),
            description: Editor::new(),
            tags: Editor::new(),
            editing_post_id: None,
            errors: ValidationErrors::default(),
        }
    }

    /// Pre-fill from an existing post, tags joined with ", "
    pub fn edit(post: &PostWithTags) -> Self {
        let form = PostForm::from_post(post);
        Self {
            current_field: PostField::Title,
            title: Editor::from_string(&form.title),
            description: Editor::from_string(&form.description),
            tags: Editor::from_string(form.tag_names.as_deref().unwrap_or_default()),
            editing_post_id: Some(post.post.id),
            errors: ValidationErrors::default(),
        }
    }

    /// The tags field is always submitted, so clearing it removes every tag
    pub fn to_form(&self) -> PostForm {
        PostForm {
            title: self.title.text(),
            description: self.description.text(),
            tag_names: Some(self.tags.text()),
        }
    }

    pub fn current_editor_mut(&mut self) -> &mut Editor {
        match self.current_field {
            PostField::Title => &mut self.title,
            PostField::Description => &mut self.description,
            PostField::Tags => &mut self.tags,
        }
    }

    /// Messages to show beside a field; tag name errors belong to the tags field
    pub fn errors_for(&self, field: PostField) -> Vec<String> {
        let keys: &[&str] = match field {
            PostField::Title => &["title"],
            PostField::Description => &["description"],
            PostField::Tags => &["name", "post_id"],
        };
        self.errors
            .errors
            .iter()
            .filter(|e| keys.contains(&e.field.as_str()))
            .map(|e| e.message.clone())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterFormField {
    Keyword,
    Tag,
    Apply,
    Clear,
    Cancel,
}

#[derive(Debug, Clone)]
pub struct FilterFormState {
    pub current_field: FilterFormField,
    pub keyword: Editor,
    pub tag_options: Vec<String>,
    pub tag_index: usize, // 0 = any tag, 1+ = tag_options[index - 1]
}

impl FilterFormState {
    pub fn selected_tag(&self) -> Option<&str> {
        match self.tag_index {
            0 => None,
            i => self.tag_options.get(i - 1).map(String::as_str),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UiState {
    pub sidebar_state: SidebarState,
    pub mode: Mode,
    pub selected_index: usize,
    pub list_state: ListState,
    pub item_view_scroll: usize,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            sidebar_state: SidebarState::Expanded,
            mode: Mode::View,
            selected_index: 0,
            list_state: ListState::default(),
            item_view_scroll: 0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FilterState {
    pub query: PostQuery,
    pub form_state: Option<FilterFormState>,
}

#[derive(Debug, Clone, Default)]
pub struct ModalState {
    pub delete_confirmation: Option<PostWithTags>,
    pub delete_modal_selection: usize, // 0 = Delete, 1 = Cancel
}

#[derive(Debug, Clone, Default)]
pub struct StatusState {
    pub message: Option<String>,
    pub message_time: Option<Instant>,
}

#[derive(Debug, Clone, Default)]
pub struct SearchState {
    pub query: String,
    pub previous_keyword: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FormState {
    pub post_form: Option<PostFormState>,
}

pub struct App {
    pub config: Config,
    pub database: Database,

    pub listing: PostListing,
    pub total_posts: usize,

    pub ui: UiState,
    pub filter: FilterState,
    pub modals: ModalState,
    pub status: StatusState,
    pub search: SearchState,
    pub form: FormState,
}

impl App {
    pub fn new(config: Config, database: Database) -> Result<Self, DatabaseError> {
        let listing = database.list_posts(&PostQuery::default())?;
        let mut app = Self {
            config,
            database,
            listing,
            total_posts: 0,
            ui: UiState::default(),
            filter: FilterState::default(),
            modals: ModalState::default(),
            status: StatusState::default(),
            search: SearchState::default(),
            form: FormState::default(),
        };
        app.load_data()?;
        Ok(app)
    }

    /// Re-run the current query and keep the selection in range
    pub fn load_data(&mut self) -> Result<(), DatabaseError> {
        self.listing = self.database.list_posts(&self.filter.query)?;
        self.total_posts = self.database.count_posts()?;
        debug!("listing {} of {} posts", self.listing.total, self.total_posts);
        self.adjust_selected_index();
        Ok(())
    }

    fn reload_or_report(&mut self) {
        if let Err(e) = self.load_data() {
            warn!("failed to reload posts: {}", e);
            self.set_status_message(format!("Failed to reload data: {}", e));
        }
    }

    pub fn selected_post(&self) -> Option<&PostWithTags> {
        self.listing.posts.get(self.ui.selected_index)
    }

    pub fn adjust_selected_index(&mut self) {
        let len = self.listing.posts.len();
        if len == 0 {
            self.ui.selected_index = 0;
            self.ui.list_state.select(None);
        } else {
            self.ui.selected_index = self.ui.selected_index.min(len - 1);
            self.sync_list_state();
        }
    }

    pub fn sync_list_state(&mut self) {
        self.ui.list_state.select(Some(self.ui.selected_index));
    }

    fn select_post_id(&mut self, id: i64) -> bool {
        match self.listing.posts.iter().position(|p| p.post.id == id) {
            Some(index) => {
                self.ui.selected_index = index;
                self.sync_list_state();
                true
            }
            None => false,
        }
    }

    pub fn move_selection_up(&mut self) {
        if self.ui.selected_index > 0 {
            self.ui.selected_index -= 1;
            self.ui.item_view_scroll = 0;
            self.sync_list_state();
        }
    }

    pub fn move_selection_down(&mut self) {
        if self.ui.selected_index + 1 < self.listing.posts.len() {
            self.ui.selected_index += 1;
            self.ui.item_view_scroll = 0;
            self.sync_list_state();
        }
    }

    pub fn toggle_sidebar(&mut self) {
        self.ui.sidebar_state = match self.ui.sidebar_state {
            SidebarState::Expanded => SidebarState::Collapsed,
            SidebarState::Collapsed => SidebarState::Expanded,
        };
    }

    pub fn set_status_message(&mut self, message: String) {
        self.status.message = Some(message);
        self.status.message_time = Some(Instant::now());
    }

    pub fn clear_status_message(&mut self) {
        self.status.message = None;
        self.status.message_time = None;
    }

    /// Check if status message should be auto-cleared (after 3 seconds)
    pub fn check_status_message_timeout(&mut self) {
        const STATUS_MESSAGE_TIMEOUT_SECS: u64 = 3;
        if let Some(time) = self.status.message_time {
            if time.elapsed().as_secs() >= STATUS_MESSAGE_TIMEOUT_SECS {
                self.clear_status_message();
            }
        }
    }

    // Queries

    fn run_query(&mut self, query: PostQuery) {
        self.filter.query = query;
        self.ui.selected_index = 0;
        self.ui.item_view_scroll = 0;
        self.reload_or_report();
    }

    /// One-line description of the active criteria for the filters box
    pub fn get_filter_summary(&self) -> String {
        let mut parts = Vec::new();
        if let Some(keyword) = self.filter.query.keyword_filter() {
            parts.push(format!("Keyword: \"{}\"", keyword));
        }
        if let Some(tag) = self.filter.query.tag_filter() {
            parts.push(format!("Tag: {}", tag));
        }
        if parts.is_empty() {
            "All posts".to_string()
        } else {
            format!("{} ({} found)", parts.join(" | "), self.listing.total)
        }
    }

    /// Start typing a keyword; results update on every keystroke
    pub fn enter_search_mode(&mut self) {
        self.ui.mode = Mode::Search;
        self.search.previous_keyword = self.filter.query.keyword.clone();
        self.search.query = self.search.previous_keyword.clone().unwrap_or_default();
    }

    pub fn add_to_search(&mut self, ch: char) {
        self.search.query.push(ch);
        self.apply_search_keyword();
    }

    pub fn remove_from_search(&mut self) {
        self.search.query.pop();
        self.apply_search_keyword();
    }

    /// Use the typed text as keyword, keeping any selected tag
    fn apply_search_keyword(&mut self) {
        let keyword = Some(self.search.query.clone()).filter(|k| !k.trim().is_empty());
        let query = PostQuery {
            keyword,
            tag: self.filter.query.tag.clone(),
        };
        self.run_query(query);
    }

    pub fn submit_search(&mut self) {
        self.ui.mode = Mode::View;
        self.search.query.clear();
        self.search.previous_keyword = None;
    }

    /// Leave search mode and restore the keyword that was active before it
    pub fn cancel_search(&mut self) {
        self.ui.mode = Mode::View;
        self.search.query = self.search.previous_keyword.take().unwrap_or_default();
        self.apply_search_keyword();
        self.search.query.clear();
    }

    pub fn enter_filter_mode(&mut self) {
        let tag_options = self.listing.all_tag_names.clone();
        let tag_index = self
            .filter
            .query
            .tag_filter()
            .and_then(|tag| tag_options.iter().position(|name| name == tag))
            .map(|i| i + 1)
            .unwrap_or(0);
        self.filter.form_state = Some(FilterFormState {
            current_field: FilterFormField::Keyword,
            keyword: Editor::from_string(self.filter.query.keyword.as_deref().unwrap_or_default()),
            tag_options,
            tag_index,
        });
        self.ui.mode = Mode::Filter;
    }

    pub fn exit_filter_mode(&mut self) {
        self.ui.mode = Mode::View;
        self.filter.form_state = None;
    }

    pub fn navigate_filter_field(&mut self, forward: bool) {
        const ORDER: [FilterFormField; 5] = [
            FilterFormField::Keyword,
            FilterFormField::Tag,
            FilterFormField::Apply,
            FilterFormField::Clear,
            FilterFormField::Cancel,
        ];
        if let Some(ref mut state) = self.filter.form_state {
            let current = ORDER.iter().position(|f| *f == state.current_field).unwrap_or(0);
            let next = if forward {
                (current + 1) % ORDER.len()
            } else {
                (current + ORDER.len() - 1) % ORDER.len()
            };
            state.current_field = ORDER[next];
        }
    }

    pub fn move_filter_tag_up(&mut self) {
        if let Some(ref mut state) = self.filter.form_state {
            state.tag_index = state.tag_index.saturating_sub(1);
        }
    }

    pub fn move_filter_tag_down(&mut self) {
        if let Some(ref mut state) = self.filter.form_state {
            if state.tag_index < state.tag_options.len() {
                state.tag_index += 1;
            }
        }
    }

    pub fn get_current_filter_editor(&mut self) -> Option<&mut Editor> {
        match self.filter.form_state {
            Some(ref mut state) if state.current_field == FilterFormField::Keyword => Some(&mut state.keyword),
            _ => None,
        }
    }

    pub fn apply_filters(&mut self) {
        if let Some(state) = self.filter.form_state.take() {
            let keyword = state.keyword.text();
            let query = PostQuery {
                keyword: Some(keyword).filter(|k| !k.trim().is_empty()),
                tag: state.selected_tag().map(str::to_string),
            };
            self.run_query(query);
            self.set_status_message(format!("{} post(s) found", self.listing.total));
        }
        self.exit_filter_mode();
    }

    pub fn clear_filters(&mut self) {
        self.run_query(PostQuery::default());
        self.exit_filter_mode();
        self.set_status_message("Filters cleared".to_string());
    }

    // Forms

    pub fn enter_create_mode(&mut self) {
        self.form.post_form = Some(PostFormState::new_post());
        self.ui.mode = Mode::Form;
    }

    pub fn enter_edit_mode(&mut self) {
        match self.selected_post() {
            Some(post) => {
                self.form.post_form = Some(PostFormState::edit(post));
                self.ui.mode = Mode::Form;
            }
            None => self.set_status_message("No post selected".to_string()),
        }
    }

    pub fn exit_form_mode(&mut self) {
        self.form.post_form = None;
        self.ui.mode = Mode::View;
    }

    pub fn navigate_form_field(&mut self, forward: bool) {
        if let Some(ref mut form) = self.form.post_form {
            form.current_field = form.current_field.next(forward);
        }
    }

    pub fn get_current_form_editor(&mut self) -> Option<&mut Editor> {
        self.form.post_form.as_mut().map(PostFormState::current_editor_mut)
    }

    pub fn is_description_field_active(&self) -> bool {
        matches!(
            self.form.post_form,
            Some(ref form) if form.current_field == PostField::Description
        )
    }

    /// Create or update from the open form. Validation failures stay in the
    /// form for inline display; other errors are returned.
    pub fn save_form(&mut self) -> Result<(), DatabaseError> {
        let Some(ref form_state) = self.form.post_form else {
            return Ok(());
        };
        let form = form_state.to_form();
        let result = match form_state.editing_post_id {
            Some(id) => self.database.update_post(id, &form),
            None => self.database.create_post(&form),
        };

        match result {
            Ok(saved) => {
                let verb = if form_state.editing_post_id.is_some() { "updated" } else { "created" };
                self.exit_form_mode();
                self.load_data()?;
                if self.select_post_id(saved.post.id) {
                    self.set_status_message(format!("Post {}", verb));
                } else {
                    self.set_status_message(format!("Post {} (hidden by current filters)", verb));
                }
                Ok(())
            }
            Err(DatabaseError::Validation(errors)) => {
                if let Some(ref mut form_state) = self.form.post_form {
                    form_state.errors = errors;
                }
                self.set_status_message("Please fix the highlighted fields".to_string());
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    // Deletion

    pub fn request_delete(&mut self) {
        match self.selected_post().cloned() {
            Some(post) => {
                self.modals.delete_confirmation = Some(post);
                self.modals.delete_modal_selection = 1;
            }
            None => self.set_status_message("No post selected".to_string()),
        }
    }

    pub fn toggle_delete_selection(&mut self) {
        self.modals.delete_modal_selection = 1 - self.modals.delete_modal_selection.min(1);
    }

    pub fn cancel_delete(&mut self) {
        self.modals.delete_confirmation = None;
    }

    /// Run the highlighted delete-modal action
    pub fn confirm_delete(&mut self) -> Result<(), DatabaseError> {
        let Some(post) = self.modals.delete_confirmation.take() else {
            return Ok(());
        };
        if self.modals.delete_modal_selection != 0 {
            return Ok(());
        }
        self.database.delete_post(post.post.id)?;
        self.load_data()?;
        self.set_status_message("Post deleted".to_string());
        Ok(())
    }

    // Help and scrolling

    pub fn enter_help_mode(&mut self) {
        self.ui.mode = Mode::Help;
    }

    pub fn exit_help_mode(&mut self) {
        self.ui.mode = Mode::View;
    }

    pub fn scroll_item_view_page_up(&mut self, viewport_height: usize) {
        self.ui.item_view_scroll = self.ui.item_view_scroll.saturating_sub(viewport_height.max(1));
    }

    pub fn scroll_item_view_page_down(&mut self, viewport_height: usize) {
        self.ui.item_view_scroll = self.ui.item_view_scroll.saturating_add(viewport_height.max(1));
    }

    pub fn scroll_item_view_to_top(&mut self) {
        self.ui.item_view_scroll = 0;
    }
}
