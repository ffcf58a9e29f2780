//! Fixed `!keyword` → gateway model bindings.

use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordBinding {
    pub keyword: &'static str,
    pub model_id: &'static str,
}

const fn bind(keyword: &'static str, model_id: &'static str) -> KeywordBinding {
    KeywordBinding { keyword, model_id }
}

// Listing order is the order shown in the help text.
const BUILTIN_BINDINGS: &[KeywordBinding] = &[
    bind("max", "openai-codex/gpt-5.1-codex-max"),
    bind("codex", "openai-codex/gpt-5.1-codex"),
    bind("mini", "openai-codex/gpt-5.1-codex-mini"),
    bind("gpt", "openai/gpt-5.1"),
    bind("opus", "anthropic/claude-opus-4-5"),
    bind("sonnet", "anthropic/claude-sonnet-4-5"),
    bind("haiku", "anthropic/claude-haiku-4-5"),
    bind("gemini", "google/gemini-3-pro-preview"),
];

const BUILTIN_HELP_ALIASES: &[&str] = &["help", "models", "keywords"];

/// Immutable keyword table shared by every request.
#[derive(Debug, Clone, Copy)]
pub struct KeywordTable {
    bindings: &'static [KeywordBinding],
    help_aliases: &'static [&'static str],
}

impl Default for KeywordTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl KeywordTable {
    pub const fn builtin() -> Self {
        Self {
            bindings: BUILTIN_BINDINGS,
            help_aliases: BUILTIN_HELP_ALIASES,
        }
    }

    /// Model bound to `keyword`; callers pass the already lower-cased keyword.
    pub fn lookup(&self, keyword: &str) -> Option<&'static str> {
        self.bindings
            .iter()
            .find(|b| b.keyword == keyword)
            .map(|b| b.model_id)
    }

    pub fn is_help_alias(&self, keyword: &str) -> bool {
        self.help_aliases.contains(&keyword)
    }

    pub fn bindings(&self) -> impl Iterator<Item = &KeywordBinding> {
        self.bindings.iter()
    }

    /// Human-readable listing returned for `!help`.
    pub fn help_text(&self) -> String {
        let mut out = String::from(
            "Start your message with one of these keywords to pick the model for that turn:\n\n",
        );
        for b in self.bindings {
            let _ = writeln!(out, "!{} -> {}", b.keyword, b.model_id);
        }

        let aliases: Vec<String> = self.help_aliases.iter().map(|a| format!("!{}", a)).collect();
        let _ = writeln!(out, "\nShow this list again with {}.", aliases.join(", "));
        if let Some(first) = self.bindings.first() {
            let _ = write!(
                out,
                "Example: !{} summarize this conversation",
                first.keyword
            );
        }
        out
    }
}
