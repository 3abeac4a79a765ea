use regex::Regex;
use std::sync::OnceLock;

fn tag_pattern() -> Option<&'static Regex> {
    static TAG: OnceLock<Option<Regex>> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"<.*?>").ok()).as_ref()
}

/// Remove every `<...>` tag, matching non-greedily. Entities are left as-is.
pub fn strip_markup(text: Option<&str>) -> Option<String> {
    let text = text?;
    Some(match tag_pattern() {
        Some(re) => re.replace_all(text, "").into_owned(),
        None => text.to_owned(),
    })
}
