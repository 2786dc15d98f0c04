use crate::language::LanguageTag;

/// Build the reply text: a tag line naming the translation path, then the
/// translated text with HTML entities decoded.
pub fn compose(
    detected: &LanguageTag,
    target: &LanguageTag,
    translated: &str,
    preceding_tag: Option<&str>,
) -> String {
    let text = html_escape::decode_html_entities(translated);
    match preceding_tag {
        Some(tag) => format!("{}\n{}", tag, text),
        None => format!("[\"{}\" -> \"{}\"]\n{}", detected, target, text),
    }
}

/// Extend an existing tag line with one more hop:
/// `["fr" -> "en"]` becomes `["fr" -> "en" -> "de"]`.
pub fn chain_tag(tag_line: &str, target: &LanguageTag) -> String {
    tag_line.replacen(']', &format!(" -> \"{}\"]", target), 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lang(code: &str) -> LanguageTag {
        LanguageTag::parse(code).unwrap()
    }

    #[test]
    fn test_compose_fresh_tag() {
        let reply = compose(&lang("en"), &lang("fr"), "Bonjour", None);
        assert_eq!(reply, "[\"en\" -> \"fr\"]\nBonjour");
    }

    #[test]
    fn test_compose_with_preceding_tag() {
        let reply = compose(
            &lang("en"),
            &lang("de"),
            "Guten Tag",
            Some("[\"fr\" -> \"en\" -> \"de\"]"),
        );
        assert_eq!(reply, "[\"fr\" -> \"en\" -> \"de\"]\nGuten Tag");
    }

    #[test]
    fn test_compose_unescapes_entities() {
        let reply = compose(
            &lang("fr"),
            &lang("en"),
            "I&#39;m &quot;here&quot; &amp; &lt;there&gt;",
            None,
        );
        assert_eq!(reply, "[\"fr\" -> \"en\"]\nI'm \"here\" & <there>");
    }

    #[test]
    fn test_chain_tag_appends_hop() {
        assert_eq!(
            chain_tag("[\"fr\" -> \"en\"]", &lang("de")),
            "[\"fr\" -> \"en\" -> \"de\"]"
        );
    }

    #[test]
    fn test_chain_tag_repeats() {
        let once = chain_tag("[\"fr\" -> \"en\"]", &lang("de"));
        let twice = chain_tag(&once, &lang("pt-BR"));
        assert_eq!(twice, "[\"fr\" -> \"en\" -> \"de\" -> \"pt-BR\"]");
    }
}
