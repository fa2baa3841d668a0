//! Small helpers shared by the part writers and readers

use std::borrow::Cow;
use std::str::FromStr;

use quick_xml::escape::escape;
use quick_xml::events::BytesStart;
use quick_xml::Reader;

pub(crate) const XML_HEADER: &str =
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

pub(crate) const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
pub(crate) const NS_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub(crate) const NS_PKG_REL: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// Escape text for element content or attribute values
pub(crate) fn escape_xml(s: &str) -> Cow<'_, str> {
    escape(s)
}

/// Reader over an in-memory part, keeping whitespace intact
pub(crate) fn part_reader(data: &[u8]) -> Reader<&[u8]> {
    let mut reader = Reader::from_reader(data);
    reader.trim_text(false);
    reader
}

/// Unescaped value of the attribute with the given local name
pub(crate) fn attr_str(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == name)
        .and_then(|attr| attr.unescape_value().ok().map(Cow::into_owned))
}

pub(crate) fn attr_parse<T: FromStr>(e: &BytesStart<'_>, name: &[u8]) -> Option<T> {
    attr_str(e, name).and_then(|v| v.trim().parse().ok())
}

/// Boolean attribute (`1`/`true`), `None` when absent
pub(crate) fn attr_bool(e: &BytesStart<'_>, name: &[u8]) -> Option<bool> {
    attr_str(e, name).map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

/// Boolean toggle element such as `<b/>` or `<b val="0"/>`
pub(crate) fn toggle_value(e: &BytesStart<'_>) -> bool {
    attr_bool(e, b"val").unwrap_or(true)
}

fn is_escape_sequence(rest: &[u8]) -> bool {
    rest.len() >= 7
        && rest[0] == b'_'
        && rest[1] == b'x'
        && rest[2..6].iter().all(u8::is_ascii_hexdigit)
        && rest[6] == b'_'
}

fn needs_escape(c: char) -> bool {
    (c < ' ' && c != '\t' && c != '\n') || c == '\u{FFFE}' || c == '\u{FFFF}'
}

/// Encode characters XML cannot carry as `_xHHHH_`
///
/// An underscore that would otherwise start such a sequence is itself
/// written as `_x005F_`.
pub(crate) fn encode_escapes(s: &str) -> Cow<'_, str> {
    let bytes = s.as_bytes();
    let plain = s
        .char_indices()
        .all(|(i, c)| !needs_escape(c) && !(c == '_' && is_escape_sequence(&bytes[i..])));
    if plain {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len() + 16);
    for (i, c) in s.char_indices() {
        if needs_escape(c) {
            out.push_str(&format!("_x{:04X}_", c as u32));
        } else if c == '_' && is_escape_sequence(&bytes[i..]) {
            out.push_str("_x005F_");
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

/// Decode `_xHHHH_` sequences
pub(crate) fn decode_escapes(s: &str) -> Cow<'_, str> {
    if !s.contains("_x") {
        return Cow::Borrowed(s);
    }

    let bytes = s.as_bytes();
    let mut out = String::with_capacity(s.len());
    let mut i = 0;
    while i < s.len() {
        if is_escape_sequence(&bytes[i..]) {
            let decoded = u32::from_str_radix(&s[i + 2..i + 6], 16)
                .ok()
                .and_then(char::from_u32);
            if let Some(c) = decoded {
                out.push(c);
                i += 7;
                continue;
            }
        }
        // `i` always sits on a char boundary here
        let c = s[i..].chars().next().unwrap_or('\u{FFFD}');
        out.push(c);
        i += c.len_utf8();
    }
    Cow::Owned(out)
}
