//! Formatting and compression of editor contents.
//! 編輯器內容的格式化與壓縮。
//!
//! JSON is validated with `serde_json` and then re-indented token by token, so
//! key order, number spelling and string escapes survive exactly as written.
//! XML goes through a `quick-xml` reader/writer pair that drops the
//! whitespace between tags.

use std::borrow::Cow;
use std::string::FromUtf8Error;

use quick_xml::events::Event;
use quick_xml::{Reader, Writer};
use serde::de::IgnoredAny;
use thiserror::Error;

use crate::document::JsonTabSettings;

const JSON_INDENT: &str = "  ";
const XML_INDENT: usize = 2;
const JSON_WHITESPACE: [char; 4] = [' ', '\t', '\n', '\r'];

/// 排版樣式。 / Layout applied to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeStyle {
    /// Two-space indentation, one member per line.
    Pretty,
    /// No insignificant whitespace.
    Compact,
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid XML: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("XML output is not UTF-8")]
    Encoding(#[from] FromUtf8Error),
}

/// 以兩格縮排格式化 JSON。 / Pretty-prints JSON with two-space indentation.
pub fn format_json(input: &str, settings: &JsonTabSettings) -> Result<String, ProcessError> {
    rewrite_json(input, settings, Some(JSON_INDENT))
}

/// 移除 JSON 中多餘的空白。 / Removes insignificant whitespace from JSON.
pub fn compress_json(input: &str, settings: &JsonTabSettings) -> Result<String, ProcessError> {
    rewrite_json(input, settings, None)
}

/// 以兩格縮排格式化 XML。 / Pretty-prints XML with two-space indentation.
pub fn format_xml(input: &str) -> Result<String, ProcessError> {
    rewrite_xml(input, true)
}

/// 移除標籤之間的空白。 / Removes the whitespace between XML tags.
pub fn compress_xml(input: &str) -> Result<String, ProcessError> {
    rewrite_xml(input, false)
}

/// With `remove_escapes`, a document pasted as one JSON string literal
/// (`"{\"a\":1}"`) is unwrapped before processing. With
/// `auto_decode_unicode`, `\uXXXX` escapes are written as the characters they
/// name, except where the character has to stay escaped.
fn rewrite_json(
    input: &str,
    settings: &JsonTabSettings,
    indent: Option<&str>,
) -> Result<String, ProcessError> {
    let source = if settings.remove_escapes {
        match serde_json::from_str::<String>(input) {
            Ok(inner) => Cow::Owned(inner),
            Err(_) => Cow::Borrowed(input),
        }
    } else {
        Cow::Borrowed(input)
    };
    serde_json::from_str::<IgnoredAny>(&source)?;
    Ok(reindent(&source, indent, settings.auto_decode_unicode))
}

/// Re-lays out text already known to be valid JSON.
fn reindent(input: &str, indent: Option<&str>, decode_unicode: bool) -> String {
    let mut out = String::with_capacity(input.len());
    let mut depth = 0usize;
    let mut rest = input;
    while let Some(ch) = rest.chars().next() {
        rest = &rest[ch.len_utf8()..];
        match ch {
            '"' => rest = copy_string(rest, &mut out, decode_unicode),
            '{' | '[' => {
                out.push(ch);
                let close = if ch == '{' { '}' } else { ']' };
                let next = rest.trim_start_matches(&JSON_WHITESPACE[..]);
                if let Some(after) = next.strip_prefix(close) {
                    out.push(close);
                    rest = after;
                } else {
                    depth += 1;
                    line_break(&mut out, indent, depth);
                }
            }
            '}' | ']' => {
                depth = depth.saturating_sub(1);
                line_break(&mut out, indent, depth);
                out.push(ch);
            }
            ',' => {
                out.push(ch);
                line_break(&mut out, indent, depth);
            }
            ':' => {
                out.push(ch);
                if indent.is_some() {
                    out.push(' ');
                }
            }
            ' ' | '\t' | '\n' | '\r' => {}
            other => out.push(other),
        }
    }
    out
}

fn line_break(out: &mut String, indent: Option<&str>, depth: usize) {
    if let Some(unit) = indent {
        out.push('\n');
        for _ in 0..depth {
            out.push_str(unit);
        }
    }
}

/// Copies one string literal whose opening quote was just consumed and
/// returns the text after its closing quote.
fn copy_string<'a>(mut rest: &'a str, out: &mut String, decode_unicode: bool) -> &'a str {
    out.push('"');
    while let Some(ch) = rest.chars().next() {
        rest = &rest[ch.len_utf8()..];
        match ch {
            '"' => {
                out.push('"');
                break;
            }
            '\\' => {
                if decode_unicode {
                    if let Some((decoded, after)) = decode_escape(rest) {
                        out.push(decoded);
                        rest = after;
                        continue;
                    }
                }
                out.push('\\');
                if let Some(next) = rest.chars().next() {
                    out.push(next);
                    rest = &rest[next.len_utf8()..];
                }
            }
            other => out.push(other),
        }
    }
    rest
}

/// `rest` follows a backslash. Yields the character named by a `uXXXX`
/// escape, or by a surrogate pair of them, when it may appear unescaped.
fn decode_escape(rest: &str) -> Option<(char, &str)> {
    let (unit, after) = hex_unit(rest)?;
    let (code, after) = if (0xD800..0xDC00).contains(&unit) {
        let (low, after) = after.strip_prefix('\\').and_then(hex_unit)?;
        if !(0xDC00..0xE000).contains(&low) {
            return None;
        }
        (0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00), after)
    } else {
        (unit, after)
    };
    let ch = char::from_u32(code)?;
    if ch == '"' || ch == '\\' || ch.is_control() {
        return None;
    }
    Some((ch, after))
}

fn hex_unit(rest: &str) -> Option<(u32, &str)> {
    let digits = rest.strip_prefix('u')?.get(..4)?;
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let unit = u32::from_str_radix(digits, 16).ok()?;
    Some((unit, &rest[5..]))
}

fn rewrite_xml(input: &str, indent: bool) -> Result<String, ProcessError> {
    let mut reader = Reader::from_str(input.trim());
    reader.trim_text(true);
    let mut writer = if indent {
        Writer::new_with_indent(Vec::new(), b' ', XML_INDENT)
    } else {
        Writer::new(Vec::new())
    };
    loop {
        match reader.read_event()? {
            Event::Eof => break,
            event => writer.write_event(event)?,
        }
    }
    Ok(String::from_utf8(writer.into_inner())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn plain() -> JsonTabSettings {
        JsonTabSettings::default()
    }

    #[test]
    fn json_is_indented_in_source_order() {
        let formatted = format_json(r#"{"b":1,"a":[true,null,{}],"c":[]}"#, &plain()).unwrap();
        assert_eq!(
            formatted,
            "{\n  \"b\": 1,\n  \"a\": [\n    true,\n    null,\n    {}\n  ],\n  \"c\": []\n}"
        );
    }

    #[test]
    fn json_compression_keeps_string_whitespace() {
        let source = "{\n  \"a b\" : [ 1.50 , \"x , y\" ]\n}";
        let compact = compress_json(source, &plain()).unwrap();
        assert_eq!(compact, r#"{"a b":[1.50,"x , y"]}"#);
    }

    #[test]
    fn escapes_are_kept_unless_unicode_decoding_is_on() {
        let escaped = |text: &str| text.replace('%', "\\");
        let source =
            escaped(r#"{"name":"caf%u00e9 %ud83d%ude00","quote":"%u0022<tag>%"","tab":"%u0009"}"#);
        assert_eq!(compress_json(&source, &plain()).unwrap(), source);

        let decoding = JsonTabSettings {
            auto_decode_unicode: true,
            ..JsonTabSettings::default()
        };
        assert_eq!(
            compress_json(&source, &decoding).unwrap(),
            escaped(r#"{"name":"café 😀","quote":"%u0022<tag>%"","tab":"%u0009"}"#)
        );
    }

    #[test]
    fn stringified_document_is_unwrapped_when_removing_escapes() {
        let settings = JsonTabSettings {
            remove_escapes: true,
            ..JsonTabSettings::default()
        };
        let source = r#""{\"a\":{\"b\":2}}""#;
        assert_eq!(
            format_json(source, &settings).unwrap(),
            "{\n  \"a\": {\n    \"b\": 2\n  }\n}"
        );
        assert_eq!(compress_json(source, &plain()).unwrap(), source);
    }

    #[test]
    fn invalid_json_is_an_error() {
        let err = format_json("{\"a\":", &plain()).unwrap_err();
        assert!(matches!(err, ProcessError::Json(_)));
        assert!(compress_json("", &plain()).is_err());
        assert!(compress_json("[1] 2", &plain()).is_err());
    }

    #[test]
    fn xml_is_indented_by_two_spaces() {
        let formatted = format_xml("  <root><a>1</a><b/></root>\n").unwrap();
        assert_eq!(formatted, "<root>\n  <a>1</a>\n  <b/>\n</root>");
    }

    #[test]
    fn xml_declaration_gets_its_own_line() {
        let formatted = format_xml(r#"<?xml version="1.0"?><root/>"#).unwrap();
        assert_eq!(formatted, "<?xml version=\"1.0\"?>\n<root/>");
    }

    #[test]
    fn xml_compression_drops_whitespace_between_tags() {
        let compact = compress_xml("<root>\n  <a>1</a>\n  <b/>\n</root>").unwrap();
        assert_eq!(compact, "<root><a>1</a><b/></root>");
    }

    #[test]
    fn mismatched_xml_tags_are_an_error() {
        let err = format_xml("<root><a></b></root>").unwrap_err();
        assert!(matches!(err, ProcessError::Xml(_)));
    }
}
