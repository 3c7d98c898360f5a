use ratatui::layout::{Constraint, Direction, Layout as RatLayout, Rect};

pub struct Layout {
    pub inner_area: Rect, // Inside the outer border
    pub sidebar_area: Rect,
    pub main_area: Rect,
    pub filters_area: Rect,
    pub status_area: Rect,
}

impl Layout {
    /// Minimum inner size: a 25 column post list plus a usable detail pane,
    /// and one content line above the filters box and status bar.
    pub const MIN_WIDTH: u16 = 38;
    pub const MIN_HEIGHT: u16 = 8;

    const SIDEBAR_MIN_WIDTH: u16 = 25;
    const SIDEBAR_MAX_PERCENT: u16 = 40;
    const MAIN_MIN_WIDTH: u16 = 10;

    pub fn calculate(size: Rect, sidebar_width_percent: u16, sidebar_collapsed: bool) -> Self {
        let width = size.width.max(Self::MIN_WIDTH + 2);
        let height = size.height.max(Self::MIN_HEIGHT + 2);

        let inner_area = Rect::new(
            size.x + 1,
            size.y + 1,
            width.saturating_sub(2),
            height.saturating_sub(2),
        );

        let sidebar_width = if sidebar_collapsed {
            0
        } else {
            let requested = inner_area.width * sidebar_width_percent / 100;
            let max_width = inner_area.width * Self::SIDEBAR_MAX_PERCENT / 100;
            requested
                .max(Self::SIDEBAR_MIN_WIDTH)
                .min(max_width)
                .min(inner_area.width.saturating_sub(Self::MAIN_MIN_WIDTH))
        };

        let vertical = RatLayout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),    // Posts + detail
                Constraint::Length(3), // Filters box
                Constraint::Length(1), // Status
            ])
            .split(inner_area);

        let horizontal = RatLayout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(sidebar_width), Constraint::Min(1)])
            .split(vertical[0]);

        Self {
            inner_area,
            sidebar_area: horizontal[0],
            main_area: horizontal[1],
            filters_area: vertical[1],
            status_area: vertical[2],
        }
    }
}
