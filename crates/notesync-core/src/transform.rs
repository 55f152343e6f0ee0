//! Markdown to Notes display format
//!
//! Notes.app renders note bodies as rich text, so Markdown syntax is rewritten
//! into glyph markers and `<br>` line breaks. The conversion is a fixed
//! sequence of passes, each working on the output of the previous one:
//!
//! 1. headings: `# x` -> `【x】`, `## x` -> `■ x`, `### x` -> `▶ x`, deeper -> `• x`
//! 2. emphasis: bold -> `【x】`, italic -> `《x》` (bold first)
//! 3. code: fenced blocks are indented by four spaces, inline spans -> `「x」`
//! 4. lists: ordered items get circled numbers, unordered items a bullet by depth
//! 5. quotes: contiguous `> ` lines become one `💬 ` paragraph
//! 6. links: `[text](url)` -> `text (url)`, `<url>` -> `url`
//! 7. horizontal rules -> a dash separator line
//! 8. normalization of blank lines, then `<br>` markup
//!
//! The conversion never fails; malformed Markdown passes through.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Paragraph break in the Notes body format
pub const PARAGRAPH_BREAK: &str = "<br><br>";

/// Line break in the Notes body format
pub const LINE_BREAK: &str = "<br>";

/// Separator line emitted for horizontal rules
pub const SEPARATOR: &str = "——————————";

const CIRCLED_NUMBERS: [&str; 10] = ["①", "②", "③", "④", "⑤", "⑥", "⑦", "⑧", "⑨", "⑩"];

static H1: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^# (.+)$").unwrap());
static H2: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^## (.+)$").unwrap());
static H3: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^### (.+)$").unwrap());
static H4_PLUS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^#{4,} (.+)$").unwrap());

static BOLD_STARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());
static BOLD_UNDERSCORES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"__(.+?)__").unwrap());
static ITALIC_STAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*([^*\n]+?)\*").unwrap());
static ITALIC_UNDERSCORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_([^_\n]+?)_").unwrap());

static INLINE_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`]+?)`").unwrap());

static ORDERED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)(\d+)\.\s+(.+)$").unwrap());
static UNORDERED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)[-*+]\s+(.+)$").unwrap());

static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+?)\]\(([^)]+?)\)").unwrap());
static AUTOLINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<(https?://[^>]+?)>").unwrap());

static HORIZONTAL_RULE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(-{3,}|\*{3,}|_{3,})$").unwrap());
static EXCESS_NEWLINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// A pure text-to-text rewrite of note content
pub trait ContentTransform: Send + Sync {
    fn convert(&self, text: &str) -> String;
}

/// Converts Markdown into the Notes display format
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownConverter;

impl MarkdownConverter {
    pub fn new() -> Self {
        Self
    }
}

impl ContentTransform for MarkdownConverter {
    fn convert(&self, text: &str) -> String {
        let text = convert_headings(text);
        let text = convert_emphasis(&text);
        let text = convert_code(&text);
        let text = convert_lists(&text);
        let text = convert_quotes(&text);
        let text = convert_links(&text);
        let text = convert_horizontal_rules(&text);
        normalize(&text)
    }
}

/// Convert Markdown with the default converter
pub fn markdown_to_notes(text: &str) -> String {
    MarkdownConverter.convert(text)
}

fn convert_headings(text: &str) -> String {
    let text = H1.replace_all(text, "【${1}】");
    let text = H2.replace_all(&text, "■ ${1}");
    let text = H3.replace_all(&text, "▶ ${1}");
    H4_PLUS.replace_all(&text, "• ${1}").into_owned()
}

fn convert_emphasis(text: &str) -> String {
    let text = BOLD_STARS.replace_all(text, "【${1}】");
    let text = BOLD_UNDERSCORES.replace_all(&text, "【${1}】");
    let text = ITALIC_STAR.replace_all(&text, "《${1}》");
    ITALIC_UNDERSCORE.replace_all(&text, "《${1}》").into_owned()
}

const FENCE: &str = "```";

fn render_code_block(lang: &str, code: &str) -> String {
    let body = code
        .trim()
        .split('\n')
        .map(|line| format!("    {}", line))
        .collect::<Vec<_>>()
        .join("\n");
    if lang.is_empty() {
        body
    } else {
        format!("[{} code]\n{}", lang, body)
    }
}

/// Fenced blocks first, then inline spans outside of them.
///
/// An unterminated fence turns the rest of the document into code.
fn convert_code(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find(FENCE) {
        out.push_str(&INLINE_CODE.replace_all(&rest[..start], "「${1}」"));

        let after = &rest[start + FENCE.len()..];
        let lang_len = after
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(after.len());
        let lang = &after[..lang_len];
        let after = &after[lang_len..];
        let after = after.strip_prefix('\n').unwrap_or(after);

        match after.find(FENCE) {
            Some(end) => {
                out.push_str(&render_code_block(lang, &after[..end]));
                rest = &after[end + FENCE.len()..];
            }
            None => {
                out.push_str(&render_code_block(lang, after));
                rest = "";
            }
        }
    }

    out.push_str(&INLINE_CODE.replace_all(rest, "「${1}」"));
    out
}

fn list_glyph(number: u64) -> String {
    match number {
        1..=10 => CIRCLED_NUMBERS[(number - 1) as usize].to_string(),
        _ => format!("({})", number),
    }
}

fn bullet_glyph(indent: &str) -> &'static str {
    match indent.chars().count() / 2 {
        0 => "•",
        1 => "◦",
        _ => "▪",
    }
}

fn convert_lists(text: &str) -> String {
    text.split('\n')
        .map(|line| {
            if let Some(caps) = ORDERED_ITEM.captures(line) {
                let glyph = caps[2]
                    .parse::<u64>()
                    .map(list_glyph)
                    .unwrap_or_else(|_| format!("({})", &caps[2]));
                return format!("{}{} {}", &caps[1], glyph, &caps[3]);
            }
            if let Some(caps) = UNORDERED_ITEM.captures(line) {
                return format!("{}{} {}", &caps[1], bullet_glyph(&caps[1]), &caps[2]);
            }
            line.to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Quote lines are joined with a line break marker so the block stays one
/// line for the normalization pass.
fn convert_quotes(text: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut quote: Vec<&str> = Vec::new();

    for line in text.split('\n') {
        if let Some(content) = line.strip_prefix("> ") {
            quote.push(content);
            continue;
        }
        if !quote.is_empty() {
            lines.push(format!("💬 {}", quote.join(LINE_BREAK)));
            quote.clear();
        }
        lines.push(line.to_string());
    }
    if !quote.is_empty() {
        lines.push(format!("💬 {}", quote.join(LINE_BREAK)));
    }

    lines.join("\n")
}

fn convert_links(text: &str) -> String {
    let text = LINK.replace_all(text, |caps: &Captures| format!("{} ({})", &caps[1], &caps[2]));
    AUTOLINK.replace_all(&text, "${1}").into_owned()
}

fn convert_horizontal_rules(text: &str) -> String {
    HORIZONTAL_RULE.replace_all(text, SEPARATOR).into_owned()
}

fn needs_gap_after(line: &str) -> bool {
    (line.starts_with('【') && line.ends_with('】'))
        || line.starts_with("■ ")
        || line.starts_with("▶ ")
        || line.starts_with("💬 ")
        || line == SEPARATOR
}

fn normalize(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut spaced: Vec<&str> = Vec::with_capacity(lines.len());

    for (i, line) in lines.iter().copied().enumerate() {
        spaced.push(line);
        let next_is_text = lines.get(i + 1).is_some_and(|next| !next.trim().is_empty());
        if !line.trim().is_empty() && needs_gap_after(line) && next_is_text {
            spaced.push("");
        }
    }

    let text = spaced.join("\n");
    let text = EXCESS_NEWLINES.replace_all(&text, "\n\n");
    text.trim()
        .replace("\n\n", PARAGRAPH_BREAK)
        .replace('\n', LINE_BREAK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn convert(text: &str) -> String {
        MarkdownConverter.convert(text)
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert_eq!(convert(""), "");
        assert_eq!(convert("  \n\n "), "");
    }

    #[rstest]
    #[case("# Title", "【Title】")]
    #[case("## Section", "■ Section")]
    #[case("### Sub", "▶ Sub")]
    #[case("#### Deep", "• Deep")]
    #[case("###### Deeper", "• Deeper")]
    fn headings(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(convert(input), expected);
    }

    #[rstest]
    #[case("**bold**", "【bold】")]
    #[case("__bold__", "【bold】")]
    #[case("*italic*", "《italic》")]
    #[case("_italic_", "《italic》")]
    #[case("a **b** and *c*", "a 【b】 and 《c》")]
    fn emphasis(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(convert(input), expected);
    }

    #[rstest]
    #[case(1, "①")]
    #[case(2, "②")]
    #[case(3, "③")]
    #[case(4, "④")]
    #[case(5, "⑤")]
    #[case(6, "⑥")]
    #[case(7, "⑦")]
    #[case(8, "⑧")]
    #[case(9, "⑨")]
    #[case(10, "⑩")]
    #[case(11, "(11)")]
    #[case(42, "(42)")]
    fn ordered_list_glyphs(#[case] number: u64, #[case] glyph: &str) {
        assert_eq!(convert(&format!("{}. item", number)), format!("{} item", glyph));
    }

    #[test]
    fn unordered_list_glyph_depends_on_indent() {
        let input = "- top\n  - one\n    - two\n      - three";
        assert_eq!(
            convert(input),
            "• top<br>  ◦ one<br>    ▪ two<br>      ▪ three"
        );
    }

    #[test]
    fn fenced_code_gets_language_header_and_indent() {
        let input = "```rust\nfn main() {}\nlet x = 1;\n```";
        assert_eq!(convert(input), "[rust code]<br>    fn main() {}<br>    let x = 1;");
    }

    #[test]
    fn fenced_code_without_language() {
        assert_eq!(convert("text\n```\nplain\n```"), "text<br>    plain");
    }

    #[test]
    fn unterminated_fence_makes_remainder_code() {
        let input = "intro\n```sh\nls -la\necho done";
        assert_eq!(convert(input), "intro<br>[sh code]<br>    ls -la<br>    echo done");
    }

    #[test]
    fn inline_code_uses_corner_brackets() {
        assert_eq!(convert("run `cargo` now"), "run 「cargo」 now");
    }

    #[test]
    fn contiguous_quotes_merge_into_one_paragraph() {
        let input = "> first\n> second\n\nafter";
        assert_eq!(convert(input), "💬 first<br>second<br><br>after");
    }

    #[test]
    fn trailing_quote_is_flushed() {
        assert_eq!(convert("text\n> end"), "text<br>💬 end");
    }

    #[test]
    fn quote_followed_by_text_gets_blank_line() {
        assert_eq!(convert("> q\nnext"), "💬 q<br><br>next");
    }

    #[rstest]
    #[case("[site](https://example.com)", "site (https://example.com)")]
    #[case("see <https://example.com>", "see https://example.com")]
    #[case("<ftp://example.com>", "<ftp://example.com>")]
    fn links(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(convert(input), expected);
    }

    #[rstest]
    #[case("---")]
    #[case("***")]
    #[case("-----")]
    #[case("___")]
    fn horizontal_rules(#[case] rule: &str) {
        assert_eq!(convert(rule), SEPARATOR);
    }

    #[test]
    fn heading_followed_by_text_gets_paragraph_break() {
        assert_eq!(convert("# Title\nBody"), "【Title】<br><br>Body");
        assert_eq!(convert("# Title\n\nBody"), "【Title】<br><br>Body");
    }

    #[test]
    fn excess_blank_lines_collapse() {
        assert_eq!(convert("a\n\n\n\nb"), "a<br><br>b");
    }

    #[test]
    fn full_document() {
        let input = "# Notes\n\n## Todo\n1. **ship** it\n- check `logs`\n\n---\nbye";
        let expected = "【Notes】<br><br>■ Todo<br><br>① 【ship】 it<br>• check 「logs」<br><br>——————————<br><br>bye";
        assert_eq!(convert(input), expected);
    }
}
