//! Stylesheet parsing: comment stripping, rule blocks and declarations.

use crate::CssDeclaration;
use crate::CssRule;
use crate::StyleSheet;

/// Parses CSS source text.
#[derive(Debug, Default)]
pub struct CssParser;

impl CssParser {
    pub fn parse(&self, input: &str) -> StyleSheet {
        let sanitized = strip_comments(input);
        let mut rules = Vec::new();
        parse_rules_recursive(&sanitized, &mut rules);
        StyleSheet { rules }
    }
}

fn parse_rules_recursive(input: &str, out: &mut Vec<CssRule>) {
    let mut cursor = 0_usize;

    while let Some((selector_raw, body_raw, next_cursor)) = next_rule_block(input, cursor) {
        cursor = next_cursor;

        let selector = normalize_ws(selector_raw);
        if selector.is_empty() {
            continue;
        }

        if selector.starts_with('@') {
            if is_grouping_at_rule(&selector) {
                parse_rules_recursive(body_raw, out);
            }
            // Keyframes, font faces and friends never match elements.
            continue;
        }

        let declarations = parse_declarations(body_raw);
        if declarations.is_empty() {
            continue;
        }

        let selectors = split_top_level(&selector, b',')
            .into_iter()
            .map(normalize_ws)
            .filter(|part| !part.is_empty())
            .collect();
        out.push(CssRule {
            selectors,
            declarations,
        });
    }
}

/// String-literal tracking shared by every scanner below.
#[derive(Debug, Default)]
struct Quotes {
    open: Option<char>,
    escape: bool,
}

impl Quotes {
    /// Feeds one character; true when it belongs to a string literal,
    /// delimiting quotes included.
    fn step(&mut self, ch: char) -> bool {
        if let Some(quote) = self.open {
            if self.escape {
                self.escape = false;
            } else if ch == '\\' {
                self.escape = true;
            } else if ch == quote {
                self.open = None;
            }
            return true;
        }

        if matches!(ch, '\'' | '"') {
            self.open = Some(ch);
            return true;
        }
        false
    }
}

/// Parenthesis and bracket nesting outside strings.
#[derive(Debug, Default)]
struct Nesting {
    quotes: Quotes,
    parens: u32,
    brackets: u32,
}

impl Nesting {
    /// True when `byte` sits at top level: outside strings, parentheses and
    /// attribute brackets.
    fn step(&mut self, byte: u8) -> bool {
        if self.quotes.step(char::from(byte)) {
            return false;
        }
        match byte {
            b'(' => self.parens = self.parens.saturating_add(1),
            b')' => self.parens = self.parens.saturating_sub(1),
            b'[' => self.brackets = self.brackets.saturating_add(1),
            b']' => self.brackets = self.brackets.saturating_sub(1),
            _ => return self.parens == 0 && self.brackets == 0,
        }
        false
    }
}

fn find_top_level(input: &str, from: usize, target: u8) -> Option<usize> {
    let mut nesting = Nesting::default();
    input
        .bytes()
        .enumerate()
        .skip(from)
        .find(|(_, byte)| nesting.step(*byte) && *byte == target)
        .map(|(idx, _)| idx)
}

fn next_rule_block(input: &str, from: usize) -> Option<(&str, &str, usize)> {
    let start = skip_rule_separators(input, from);
    if start >= input.len() {
        return None;
    }

    let open = find_top_level(input, start, b'{')?;
    let close = find_matching_brace(input, open)?;
    let selector = &input[start..open];
    let body = &input[open + 1..close];

    Some((selector, body, close + 1))
}

fn skip_rule_separators(input: &str, from: usize) -> usize {
    input
        .bytes()
        .enumerate()
        .skip(from)
        .find(|(_, byte)| !(byte.is_ascii_whitespace() || *byte == b';'))
        .map_or(input.len(), |(idx, _)| idx)
}

fn find_matching_brace(input: &str, open_brace: usize) -> Option<usize> {
    if input.as_bytes().get(open_brace).copied() != Some(b'{') {
        return None;
    }

    let mut quotes = Quotes::default();
    let mut depth = 1_u32;
    for (idx, byte) in input.bytes().enumerate().skip(open_brace.saturating_add(1)) {
        if quotes.step(char::from(byte)) {
            continue;
        }
        match byte {
            b'{' => depth = depth.saturating_add(1),
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }

    None
}

fn is_grouping_at_rule(selector: &str) -> bool {
    let lower = selector.to_ascii_lowercase();
    ["@media", "@supports", "@layer", "@document"]
        .iter()
        .any(|prefix| lower.starts_with(prefix))
}

fn strip_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut quotes = Quotes::default();
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if quotes.step(ch) {
            out.push(ch);
            continue;
        }

        if ch == '/' && chars.peek() == Some(&'*') {
            chars.next();
            let mut previous = '\0';
            for inner in chars.by_ref() {
                if previous == '*' && inner == '/' {
                    break;
                }
                previous = inner;
            }
            // A comment separates tokens.
            out.push(' ');
            continue;
        }

        out.push(ch);
    }

    out
}

fn normalize_ws(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_declarations(input: &str) -> Vec<CssDeclaration> {
    let mut declarations = Vec::new();
    for declaration in split_top_level(input, b';') {
        let trimmed = declaration.trim();
        if trimmed.is_empty() {
            continue;
        }

        let Some(colon_idx) = find_top_level(trimmed, 0, b':') else {
            continue;
        };

        let name = normalize_ws(&trimmed[..colon_idx]).to_ascii_lowercase();
        let raw_value = normalize_value(&trimmed[colon_idx + 1..]);
        let (value, important) = split_important(&raw_value);
        if name.is_empty() || value.is_empty() {
            continue;
        }

        declarations.push(CssDeclaration {
            name,
            value: value.to_owned(),
            important,
        });
    }

    declarations
}

fn split_important(value: &str) -> (&str, bool) {
    match value.rfind('!') {
        Some(bang) if value[bang + 1..].trim().eq_ignore_ascii_case("important") => {
            (value[..bang].trim_end(), true)
        }
        _ => (value, false),
    }
}

fn split_top_level(input: &str, delimiter: u8) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0_usize;
    let mut nesting = Nesting::default();

    for (idx, byte) in input.bytes().enumerate() {
        if nesting.step(byte) && byte == delimiter {
            parts.push(&input[start..idx]);
            start = idx.saturating_add(1);
        }
    }
    parts.push(&input[start..]);

    parts
}

/// Collapses whitespace runs outside strings to one space.
fn normalize_value(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut quotes = Quotes::default();
    let mut pending_space = false;

    for ch in input.trim().chars() {
        if !quotes.step(ch) && ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.push(ch);
    }

    out
}
