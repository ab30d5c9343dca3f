//! Byte-to-text decoding for saved comment pages.

use encoding_rs::Encoding;

/// How many leading bytes are searched for a `<meta charset>` declaration.
const SNIFF_PREFIX_BYTES: usize = 8192;

/// Decodes `body` using `forced` if given, else the charset the document
/// declares, else UTF-8 with replacement characters.
///
/// Returns the text together with the name of the encoding that was used.
pub fn decode_document(body: &[u8], forced: Option<&str>) -> (String, &'static str) {
    let label = forced
        .map(str::to_owned)
        .or_else(|| parse_charset_from_html_prefix(body));

    if let Some(label) = label {
        match Encoding::for_label(label.as_bytes()) {
            Some(encoding) => {
                let (decoded, used, had_errors) = encoding.decode(body);
                if had_errors {
                    tracing::warn!(encoding = used.name(), "input contained malformed sequences");
                }
                return (decoded.into_owned(), used.name());
            }
            None => tracing::warn!(label = label.as_str(), "unknown charset label; using UTF-8"),
        }
    }

    (String::from_utf8_lossy(body).into_owned(), encoding_rs::UTF_8.name())
}

fn parse_charset_from_html_prefix(body: &[u8]) -> Option<String> {
    let prefix_len = body.len().min(SNIFF_PREFIX_BYTES);
    let prefix = String::from_utf8_lossy(&body[..prefix_len]);
    let lower = prefix.to_ascii_lowercase();
    let mut search_start = 0_usize;

    while let Some(relative) = lower[search_start..].find("charset=") {
        let charset_start = search_start + relative + "charset=".len();
        if let Some(label) = parse_charset_label(&prefix[charset_start..]) {
            return Some(label);
        }
        search_start = charset_start;
    }

    None
}

fn parse_charset_label(input: &str) -> Option<String> {
    let trimmed = input.trim_start();
    let first = trimmed.chars().next()?;

    let label = if first == '"' || first == '\'' {
        let rest = &trimmed[first.len_utf8()..];
        &rest[..rest.find(first)?]
    } else {
        let end = trimmed
            .find(|ch: char| ch.is_whitespace() || matches!(ch, '"' | '\'' | ';' | '>' | '/'))
            .unwrap_or(trimmed.len());
        &trimmed[..end]
    };

    let label = label.trim();
    (!label.is_empty()).then(|| label.to_owned())
}

#[cfg(test)]
mod tests {
    use super::decode_document;
    use super::parse_charset_label;

    #[test]
    fn reads_meta_charset_labels() {
        assert_eq!(parse_charset_label("\"windows-1251\">").as_deref(), Some("windows-1251"));
        assert_eq!(parse_charset_label("utf-8 />").as_deref(), Some("utf-8"));
        assert_eq!(parse_charset_label("  ''"), None);
        assert_eq!(parse_charset_label(""), None);
    }

    #[test]
    fn decodes_declared_cyrillic_page() {
        // "Привет" in windows-1251.
        let mut body = b"<meta charset=\"windows-1251\"><p>".to_vec();
        body.extend_from_slice(&[0xcf, 0xf0, 0xe8, 0xe2, 0xe5, 0xf2]);
        let (text, encoding) = decode_document(&body, None);
        assert_eq!(encoding, "windows-1251");
        assert!(text.ends_with("<p>Привет"));
    }

    #[test]
    fn forced_label_wins_and_unknown_labels_fall_back() {
        let body = "<meta http-equiv=\"Content-Type\" content=\"text/html; charset=koi8-r\">ok";
        let (_, encoding) = decode_document(body.as_bytes(), Some("utf-8"));
        assert_eq!(encoding, "UTF-8");
        let (_, sniffed) = decode_document(body.as_bytes(), None);
        assert_eq!(sniffed, "KOI8-R");
        let (text, fallback) = decode_document("plain".as_bytes(), Some("no-such-charset"));
        assert_eq!((text.as_str(), fallback), ("plain", "UTF-8"));
    }
}
