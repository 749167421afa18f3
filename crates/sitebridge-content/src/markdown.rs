//! Staged HTML-to-Markdown rewriting.
//!
//! A fixed, ordered pipeline of text rewrites. Ordering is load-bearing:
//! structural conversions (headers, paragraphs, anchors, emphasis, lists)
//! must run before the catch-all tag strip, entity decoding runs
//! second-to-last, and whitespace collapsing last. Unmatched or malformed
//! tags simply fail their structural rule and are removed by the catch-all.

use std::sync::OnceLock;

use regex::Regex;

/// The six entities the converter decodes, in application order.
const ENTITIES: [(&str, &str); 6] = [
    ("&nbsp;", " "),
    ("&amp;", "&"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
];

fn block_strips() -> &'static [Regex] {
    static RULES: OnceLock<Vec<Regex>> = OnceLock::new();
    RULES.get_or_init(|| {
        vec![
            Regex::new(r"(?is)<script\b[^>]*>.*?</script>").expect("valid script pattern"),
            Regex::new(r"(?is)<style\b[^>]*>.*?</style>").expect("valid style pattern"),
        ]
    })
}

fn structural_rewrites() -> &'static [(Regex, String)] {
    static RULES: OnceLock<Vec<(Regex, String)>> = OnceLock::new();
    RULES.get_or_init(|| {
        let mut rules = Vec::new();
        for level in 1..=4usize {
            rules.push((
                Regex::new(&format!(r"(?is)<h{level}\b[^>]*>(.*?)</h{level}>"))
                    .expect("valid header pattern"),
                format!("{} ${{1}}\n\n", "#".repeat(level)),
            ));
        }
        rules.push((
            Regex::new(r"(?is)<p\b[^>]*>(.*?)</p>").expect("valid paragraph pattern"),
            "${1}\n\n".to_string(),
        ));
        rules.push((
            Regex::new(r#"(?is)<a\b[^>]*href\s*=\s*["']([^"']*)["'][^>]*>(.*?)</a>"#)
                .expect("valid anchor pattern"),
            "[${2}](${1})".to_string(),
        ));
        rules.push((
            Regex::new(r"(?is)<(?:strong|b)\b[^>]*>(.*?)</(?:strong|b)>")
                .expect("valid bold pattern"),
            "**${1}**".to_string(),
        ));
        rules.push((
            Regex::new(r"(?is)<(?:em|i)\b[^>]*>(.*?)</(?:em|i)>").expect("valid italic pattern"),
            "*${1}*".to_string(),
        ));
        rules.push((
            Regex::new(r"(?is)<pre\b[^>]*>(.*?)</pre>").expect("valid pre pattern"),
            "```\n${1}\n```\n\n".to_string(),
        ));
        rules.push((
            Regex::new(r"(?is)<code\b[^>]*>(.*?)</code>").expect("valid code pattern"),
            "`${1}`".to_string(),
        ));
        rules.push((
            Regex::new(r"(?is)<li\b[^>]*>(.*?)</li>").expect("valid list item pattern"),
            "- ${1}\n".to_string(),
        ));
        rules
    })
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[^>]+>").expect("valid tag pattern"))
}

fn blank_lines_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").expect("valid blank line pattern"))
}

/// Remove every remaining `<...>` tag. Runs after the structural rules so
/// anything they matched has already been rewritten.
pub fn strip_tags(text: &str) -> String {
    tag_re().replace_all(text, "").into_owned()
}

/// Decode the six common HTML entities, in the fixed order of [`ENTITIES`].
pub fn decode_entities(text: &str) -> String {
    let mut out = text.to_string();
    for (entity, replacement) in ENTITIES {
        out = out.replace(entity, replacement);
    }
    out
}

/// Collapse runs of three or more newlines to exactly two.
pub fn collapse_blank_lines(text: &str) -> String {
    blank_lines_re().replace_all(text, "\n\n").into_owned()
}

/// Convert HTML to Markdown via the staged rewrite pipeline.
pub fn html_to_markdown(html: &str) -> String {
    let mut text = html.to_string();
    for rule in block_strips() {
        text = rule.replace_all(&text, "").into_owned();
    }
    for (rule, replacement) in structural_rewrites() {
        text = rule.replace_all(&text, replacement.as_str()).into_owned();
    }
    let text = strip_tags(&text);
    let text = decode_entities(&text);
    let text = collapse_blank_lines(&text);
    text.trim().to_string()
}
