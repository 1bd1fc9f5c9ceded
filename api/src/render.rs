use crate::chat_payload::{ChatMessage, Role, SourceCard};
use agent_system::SourceLink;

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn user_message(text: &str) -> ChatMessage {
    ChatMessage {
        role: Role::User,
        content: text.to_string(),
        html: escape_html(text),
        sources: Vec::new(),
    }
}

/// Assistant turn: cited documents become in-page anchors to their download cards.
pub fn assistant_message(text: &str, links: &[SourceLink]) -> ChatMessage {
    let mut html = escape_html(text);
    let mut sources = Vec::with_capacity(links.len());

    for (i, link) in links.iter().enumerate() {
        let anchor_id = format!("source-card-{}", i);
        let anchor = format!(
            r##"<a href="#{}" class="source-anchor">{}</a>"##,
            anchor_id,
            escape_html(&link.text)
        );
        html = html.replacen(&escape_html(&link.original_link), &anchor, 1);
        log::debug!("Replaced link {}: {}", i, link.original_link);

        sources.push(SourceCard {
            id: anchor_id,
            title: link.filename.clone(),
            url: link.url.clone(),
        });
    }

    ChatMessage {
        role: Role::Assistant,
        content: text.to_string(),
        html,
        sources,
    }
}
