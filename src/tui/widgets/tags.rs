use ratatui::style::{Modifier, Style};
use ratatui::text::Span;
use crate::models::Tag;

/// `[Ruby] [Rails]`, or an empty string for an untagged post
pub fn format_tags_brackets(tags: &[Tag]) -> String {
    tags.iter()
        .map(|tag| format!("[{}]", tag.name))
        .collect::<Vec<_>>()
        .join(" ")
}

/// One styled span per tag, separated by spaces
pub fn tag_spans(tags: &[Tag], style: Style) -> Vec<Span<'static>> {
    let mut spans = Vec::with_capacity(tags.len() * 2);
    for (i, tag) in tags.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" "));
        }
        spans.push(Span::styled(format!("[{}]", tag.name), style.add_modifier(Modifier::BOLD)));
    }
    spans
}
