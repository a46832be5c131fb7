//! Reader and writer for the properties-style record file.
//!
//! The format is the classic `key=value` properties layout: `#`/`!`
//! comments, `=`/`:`/whitespace separators, backslash escapes and line
//! continuations. Files written by older tooling load unchanged.

use chrono::{DateTime, Utc};

use super::{ALL_VIEWED_KEY, WatchRecord};

/// Decode raw file bytes. Latin-1 is the fallback for non UTF-8 files.
pub fn decode_bytes(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_owned(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Parse record text. Never fails: malformed lines degrade per entry.
pub fn parse(text: &str) -> WatchRecord {
    let mut record = WatchRecord::new();
    for (key, value) in parse_pairs(text) {
        record.apply_raw(key, value);
    }
    record
}

/// Parse text into raw, unescaped key/value pairs in file order.
pub fn parse_pairs(text: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut lines = text.lines();

    while let Some(first) = lines.next() {
        let trimmed = trim_leading(first);
        if trimmed.is_empty()
            || trimmed.starts_with('#')
            || trimmed.starts_with('!')
        {
            continue;
        }

        let mut logical = String::from(trimmed);
        while ends_with_continuation(&logical) {
            logical.pop();
            match lines.next() {
                Some(next) => logical.push_str(trim_leading(next)),
                None => break,
            }
        }

        let (raw_key, raw_value) = split_key_value(&logical);
        pairs.push((unescape(raw_key), unescape(raw_value)));
    }

    pairs
}

fn trim_leading(line: &str) -> &str {
    line.trim_start_matches([' ', '\t', '\u{c}'])
}

fn ends_with_continuation(line: &str) -> bool {
    let slashes = line.chars().rev().take_while(|&c| c == '\\').count();
    slashes % 2 == 1
}

fn is_separator(c: char) -> bool {
    matches!(c, '=' | ':')
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\u{c}')
}

fn split_key_value(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();

    for (idx, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if c == '\\' {
            escaped = true;
        } else if is_separator(c) || is_blank(c) {
            key_end = idx;
            break;
        }
    }

    let key = &line[..key_end];
    let mut rest = line[key_end..].trim_start_matches(is_blank);
    if let Some(first) = rest.chars().next()
        && is_separator(first)
    {
        rest = rest[first.len_utf8()..].trim_start_matches(is_blank);
    }

    (key, rest)
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.clone().take(4).collect();
                match u16::from_str_radix(&hex, 16) {
                    Ok(unit) if hex.len() == 4 => {
                        chars.nth(3);
                        push_utf16_unit(&mut out, &mut chars, unit);
                    }
                    // Malformed escape: keep the letter.
                    _ => out.push('u'),
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    out
}

fn push_utf16_unit(out: &mut String, chars: &mut std::str::Chars<'_>, unit: u16) {
    if (0xD800..0xDC00).contains(&unit) {
        // High surrogate: pair it with a following `\uDCxx` when present.
        let lookahead: String = chars.clone().take(6).collect();
        if let Some(low_hex) = lookahead.strip_prefix("\\u")
            && let Ok(low) = u16::from_str_radix(low_hex, 16)
            && (0xDC00..0xE000).contains(&low)
        {
            chars.nth(5);
            if let Some(c) = char::decode_utf16([unit, low]).next().and_then(|r| r.ok()) {
                out.push(c);
                return;
            }
        }
        out.push(char::REPLACEMENT_CHARACTER);
        return;
    }
    out.push(char::from_u32(u32::from(unit)).unwrap_or(char::REPLACEMENT_CHARACTER));
}

/// Render a record as properties text with a timestamp header.
pub fn render(record: &WatchRecord, written_at: DateTime<Utc>) -> String {
    let mut out = String::new();
    out.push('#');
    out.push_str(&written_at.format("%a %b %d %H:%M:%S UTC %Y").to_string());
    out.push('\n');

    if let Some(all_viewed) = record.all_viewed_flag() {
        push_pair(&mut out, ALL_VIEWED_KEY, if all_viewed { "true" } else { "false" });
    }
    for (key, value) in record.raw_pairs() {
        push_pair(&mut out, key, &value);
    }

    out
}

fn push_pair(out: &mut String, key: &str, value: &str) {
    escape_into(out, key, true);
    out.push('=');
    escape_into(out, value, false);
    out.push('\n');
}

fn escape_into(out: &mut String, text: &str, is_key: bool) {
    for (idx, c) in text.chars().enumerate() {
        match c {
            ' ' if is_key || idx == 0 => out.push_str("\\ "),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{c}' => out.push_str("\\f"),
            '\\' | '=' | ':' | '#' | '!' => {
                out.push('\\');
                out.push(c);
            }
            ' '..='~' => out.push(c),
            _ => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    out.push_str(&format!("\\u{unit:04X}"));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use viewstatus_model::WatchPercent;

    fn pairs(text: &str) -> Vec<(String, String)> {
        parse_pairs(text)
    }

    #[test]
    fn parses_plain_pairs_and_comments() {
        let text = "#Sat Oct 17 10:00:00 UTC 2026\n! bang comment\n\nmovie.mkv=42\nallviewed=false\n";
        assert_eq!(
            pairs(text),
            vec![
                ("movie.mkv".to_string(), "42".to_string()),
                ("allviewed".to_string(), "false".to_string()),
            ]
        );
    }

    #[test]
    fn accepts_colon_and_whitespace_separators() {
        assert_eq!(pairs("a.mkv : 10")[0], ("a.mkv".into(), "10".into()));
        assert_eq!(pairs("b.mkv 20")[0], ("b.mkv".into(), "20".into()));
        assert_eq!(pairs("  c.mkv=\t30")[0], ("c.mkv".into(), "30".into()));
    }

    #[test]
    fn unescapes_keys_written_by_java_tooling() {
        let text = "The\\ Thing\\ (1982).mkv=75\nCaf\\u00E9.mp4=5\nA\\=B.avi=1";
        let parsed = pairs(text);
        assert_eq!(parsed[0].0, "The Thing (1982).mkv");
        assert_eq!(parsed[1].0, "Café.mp4");
        assert_eq!(parsed[2].0, "A=B.avi");
    }

    #[test]
    fn joins_continuation_lines() {
        let text = "long\\\n    name.mkv=3\nx=1\\\\\ny=2";
        let parsed = pairs(text);
        assert_eq!(parsed[0], ("longname.mkv".into(), "3".into()));
        // An even number of backslashes is an escaped backslash, not a join.
        assert_eq!(parsed[1], ("x".into(), "1\\".into()));
        assert_eq!(parsed[2], ("y".into(), "2".into()));
    }

    #[test]
    fn decodes_surrogate_pairs() {
        let parsed = pairs("\\uD83C\\uDFAC.mkv=9");
        assert_eq!(parsed[0].0, "\u{1F3AC}.mkv");
    }

    #[test]
    fn latin1_fallback_for_invalid_utf8() {
        let bytes = b"caf\xe9.mkv=12";
        assert_eq!(decode_bytes(bytes), "café.mkv=12");
    }

    #[test]
    fn render_escapes_and_reparses_to_same_pairs() {
        let mut record = WatchRecord::new();
        record.set_percent("The Thing: Director's Cut #2.mkv", WatchPercent::clamped(61));
        record.set_percent("Amélie.mkv", WatchPercent::clamped(100));
        record.set_all_viewed(false);
        let at = Utc.with_ymd_and_hms(2026, 10, 17, 8, 30, 0).unwrap();

        let text = render(&record, at);

        assert!(text.starts_with("#Sat Oct 17 08:30:00 UTC 2026\n"));
        assert!(text.contains("The\\ Thing\\:\\ Director's\\ Cut\\ \\#2.mkv=61"));
        assert!(text.contains("Am\\u00E9lie.mkv=100"));
        assert!(text.is_ascii());
        assert_eq!(parse(&text), record);
    }
}
