//! Character-reference escaping.
//!
//! The same five characters are escaped in text and attribute values, so a
//! single escaper covers both contexts.

use std::borrow::Cow;

/// Escape `& < > " '` into character references.
///
/// Borrows when nothing needs escaping.
pub fn escape(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(s);
    }

    let mut escaped = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

/// Append the escaped form of `s` to `out`.
pub fn escape_into(s: &str, out: &mut String) {
    out.push_str(&escape(s));
}

/// Invert [`escape`].
///
/// Only the references `escape` produces are decoded; anything else,
/// including other valid references, is left untouched.
pub fn unescape(s: &str) -> Cow<'_, str> {
    if !s.contains('&') {
        return Cow::Borrowed(s);
    }

    const REFS: [(&str, char); 5] = [
        ("&amp;", '&'),
        ("&lt;", '<'),
        ("&gt;", '>'),
        ("&quot;", '"'),
        ("&#x27;", '\''),
    ];

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        match REFS.iter().find(|(r, _)| rest.starts_with(r)) {
            Some((r, c)) => {
                out.push(*c);
                rest = &rest[r.len()..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// Make a JSON document safe to place inside a `<script>` element.
///
/// `</` becomes `<\/` and `<!--` becomes `<\u0021--`. JSON reads both back
/// unchanged, while the HTML tokenizer sees neither a closing tag nor the
/// start of an escaped script section.
pub fn escape_script_json(json: &str) -> String {
    json.replace("</", "<\\/").replace("<!--", "<\\u0021--")
}
