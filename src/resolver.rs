use crate::compose::chain_tag;
use crate::language::LanguageTag;
use crate::platform::IncomingMessage;

const QUOTES: &[char] = &['"', '\'', '“', '”', '«', '»'];

/// Raw result of reading the addressed message itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub language: LanguageTag,
    pub text: String,
    /// False when the text has to come from the replied-to message
    pub has_direct_text: bool,
}

/// Everything needed to translate and reply to one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRequest {
    pub target_language: LanguageTag,
    pub source_text: String,
    /// Rewritten tag line of a bot translation being translated again
    pub preceding_tag: Option<String>,
}

/// Decides which language and which text an addressed message refers to.
#[derive(Debug, Clone)]
pub struct Resolver {
    default_language: LanguageTag,
}

impl Resolver {
    pub fn new(default_language: LanguageTag) -> Self {
        Self { default_language }
    }

    /// Read `@bot [lang] [text...]`. The message is split into at most three
    /// parts: the mention (ignored), the second word and the rest, which is
    /// kept exactly as written.
    pub fn resolve(&self, text: &str) -> Target {
        let (_mention, after_mention) = split_word(text);
        if after_mention.is_empty() {
            return self.target(self.default_language.clone(), String::new(), false);
        }

        let (word, rest) = split_word(after_mention);
        match (parse_language(word), rest.is_empty()) {
            (Some(language), true) => self.target(language, String::new(), false),
            (Some(language), false) => self.target(language, rest.to_string(), true),
            (None, _) => self.target(self.default_language.clone(), after_mention.to_string(), true),
        }
    }

    /// Resolve the full request, falling back to the reply chain when the
    /// message carries no text of its own. Returns `None` when there is
    /// nothing to translate.
    pub fn request(&self, message: &IncomingMessage) -> Option<ResolvedRequest> {
        let target = self.resolve(&message.text);

        let (source_text, preceding_tag) = if target.has_direct_text {
            (target.text, None)
        } else {
            let replied = message.reply_to.as_deref()?;
            from_reply(replied, &target.language)
        };

        if source_text.trim().is_empty() {
            return None;
        }

        Some(ResolvedRequest {
            target_language: target.language,
            source_text,
            preceding_tag,
        })
    }

    fn target(&self, language: LanguageTag, text: String, has_direct_text: bool) -> Target {
        Target {
            language,
            text,
            has_direct_text,
        }
    }
}

/// Split off the first word. Both halves are trimmed at the outer edges
/// only, so the remainder keeps its inner spacing and line breaks.
fn split_word(text: &str) -> (&str, &str) {
    let text = text.trim();
    match text.find(char::is_whitespace) {
        Some(end) => (&text[..end], text[end..].trim_start()),
        None => (text, ""),
    }
}

fn parse_language(word: &str) -> Option<LanguageTag> {
    LanguageTag::parse(word.trim_matches(QUOTES)).ok()
}

/// Split a replied-to message into the text to translate and, for one of the
/// bot's own translations, the chained tag that should head the new reply.
fn from_reply(replied: &IncomingMessage, target: &LanguageTag) -> (String, Option<String>) {
    if replied.sender_is_self {
        if let Some((first_line, body)) = replied.text.split_once('\n') {
            let first_line = first_line.trim_end_matches('\r');
            if first_line.starts_with('[') && first_line.ends_with(']') {
                return (body.to_string(), Some(chain_tag(first_line, target)));
            }
        }
    }
    (replied.text.clone(), None)
}
