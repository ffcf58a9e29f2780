use crate::server::chat_request::Message;

const KEYWORD_SIGIL: char = '!';

/// The latest user message and the `!keyword` it may lead with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inspection {
    /// Position of the message inside `messages`.
    pub index: usize,
    /// Lower-cased keyword without the sigil; `None` when the text does not start with `!`.
    pub keyword: Option<String>,
    /// Text after the keyword, or the whole trimmed text when there is no keyword.
    pub remainder: String,
}

/// Finds the last `user` message and splits off a leading keyword.
///
/// Returns `None` when there is no user message or when the latest one does not carry
/// plain-text content (multimodal parts are never inspected).
pub fn inspect(messages: &[Message]) -> Option<Inspection> {
    let (index, message) = messages
        .iter()
        .enumerate()
        .rev()
        .find(|(_, m)| m.role == "user")?;
    let text = message.text()?;
    let (keyword, remainder) = split_keyword(text);

    Some(Inspection {
        index,
        keyword,
        remainder,
    })
}

fn split_keyword(text: &str) -> (Option<String>, String) {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix(KEYWORD_SIGIL) else {
        return (None, trimmed.to_string());
    };

    match rest.split_once(char::is_whitespace) {
        Some((keyword, tail)) => (Some(keyword.to_lowercase()), tail.trim_start().to_string()),
        None => (Some(rest.to_lowercase()), String::new()),
    }
}
