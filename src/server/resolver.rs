use crate::server::chat_request::ChatRequest;
use crate::server::inspector::inspect;
use crate::server::keywords::KeywordTable;

/// Decision taken for one chat request.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Answer locally with the keyword listing.
    Help,
    /// Forward `request`, which has the model overridden and the keyword stripped.
    Rewrite {
        request: ChatRequest,
        keyword: String,
        model: &'static str,
    },
    /// Forward the original request untouched.
    Passthrough,
}

/// Resolves the `!keyword` command in the latest user message.
///
/// An unknown keyword is not stripped: `!foo bar` goes upstream verbatim as ordinary text.
pub fn resolve(request: &ChatRequest, table: &KeywordTable, enabled: bool) -> Resolution {
    if !enabled {
        return Resolution::Passthrough;
    }
    let Some(found) = inspect(&request.messages) else {
        return Resolution::Passthrough;
    };
    let Some(keyword) = found.keyword else {
        return Resolution::Passthrough;
    };

    if table.is_help_alias(&keyword) {
        return Resolution::Help;
    }
    let Some(model) = table.lookup(&keyword) else {
        return Resolution::Passthrough;
    };

    let mut rewritten = request.clone();
    rewritten.model = Some(model.to_string());
    rewritten.messages[found.index] = request.messages[found.index].with_text(found.remainder);

    Resolution::Rewrite {
        request: rewritten,
        keyword,
        model,
    }
}
