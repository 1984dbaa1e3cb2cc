// Copyright (C) 2025 Ryan Daum <ryan.daum@gmail.com> This program is free
// software: you can redistribute it and/or modify it under the terms of the GNU
// General Public License as published by the Free Software Foundation, version
// 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Go's automatic semicolon insertion.
//!
//! The grammar treats line breaks as whitespace and relies on `;` to end statements. Before
//! parsing, a `;` is written directly after the last token of every line that ends in an
//! identifier, a literal, one of the keywords `break`, `continue`, `fallthrough` or `return`,
//! `++`, `--`, or a closing `)`, `]` or `}`. A comment that spans lines counts as a line break.
//!
//! The `;` goes right after the token rather than at the line break, so every token keeps its
//! line and column. Byte offsets past an insertion shift by one; [`OffsetMap::source_offset`]
//! maps them back.

const KEYWORDS: &[&str] = &[
    "break",
    "case",
    "chan",
    "const",
    "continue",
    "default",
    "defer",
    "else",
    "fallthrough",
    "for",
    "func",
    "go",
    "goto",
    "if",
    "import",
    "interface",
    "map",
    "package",
    "range",
    "return",
    "select",
    "struct",
    "switch",
    "type",
    "var",
];

/// Keywords that end a statement when they end a line.
const TERMINATING_KEYWORDS: &[&str] = &["break", "continue", "fallthrough", "return"];

/// Maps byte offsets in text with inserted semicolons back to the original source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffsetMap {
    /// Offsets in the rewritten text of the inserted semicolons, ascending.
    inserted: Vec<usize>,
}

impl OffsetMap {
    pub fn source_offset(&self, offset: usize) -> usize {
        offset - self.inserted.partition_point(|&at| at < offset)
    }

    pub fn inserted(&self) -> &[usize] {
        &self.inserted
    }

    /// `text`, found at `start` in the rewritten text, without the semicolons inserted into it.
    pub fn original_text(&self, text: &str, start: usize) -> String {
        let end = start + text.len();
        let first = self.inserted.partition_point(|&at| at < start);
        let mut original = String::with_capacity(text.len());
        let mut copied = start;
        for &at in self.inserted[first..].iter().take_while(|&&at| at < end) {
            original.push_str(&text[copied - start..at - start]);
            copied = at + 1;
        }
        original.push_str(&text[copied - start..]);
        original
    }
}

/// Source text with the implied semicolons written out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Terminated {
    pub text: String,
    pub offsets: OffsetMap,
}

pub fn insert_semicolons(source: &str) -> Terminated {
    let bytes = source.as_bytes();
    let mut points = vec![];
    // End of the last token on the current line, if that token ends a statement.
    let mut pending: Option<usize> = None;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match b {
            b'\n' => {
                points.extend(pending.take());
                i += 1;
            }
            b' ' | b'\t' | b'\r' => i += 1,
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                i = source[i..].find('\n').map_or(bytes.len(), |nl| i + nl);
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let end = source[i + 2..]
                    .find("*/")
                    .map_or(bytes.len(), |close| i + 2 + close + 2);
                if source[i..end].contains('\n') {
                    points.extend(pending.take());
                }
                i = end;
            }
            b'"' | b'\'' => {
                i = quoted_end(bytes, i);
                pending = Some(i);
            }
            b'`' => {
                i = source[i + 1..]
                    .find('`')
                    .map_or(bytes.len(), |close| i + 1 + close + 1);
                pending = Some(i);
            }
            b'+' | b'-' if bytes.get(i + 1) == Some(&b) => {
                i += 2;
                pending = Some(i);
            }
            b')' | b']' | b'}' => {
                i += 1;
                pending = Some(i);
            }
            b'0'..=b'9' => {
                i = number_end(bytes, i);
                pending = Some(i);
            }
            b'.' if bytes.get(i + 1).is_some_and(u8::is_ascii_digit) => {
                i = number_end(bytes, i);
                pending = Some(i);
            }
            _ if b == b'_' || b.is_ascii_alphabetic() || !b.is_ascii() => {
                let start = i;
                i = word_end(source, i);
                if i == start {
                    // A non-ASCII character that is not part of a word, such as a byte order mark.
                    i += source[i..].chars().next().map_or(1, char::len_utf8);
                    continue;
                }
                let word = &source[start..i];
                let ends_statement =
                    !KEYWORDS.contains(&word) || TERMINATING_KEYWORDS.contains(&word);
                pending = ends_statement.then_some(i);
            }
            _ => {
                i += 1;
                pending = None;
            }
        }
    }
    points.extend(pending);

    let mut text = String::with_capacity(source.len() + points.len());
    let mut inserted = Vec::with_capacity(points.len());
    let mut copied = 0;
    for point in points {
        text.push_str(&source[copied..point]);
        inserted.push(text.len());
        text.push(';');
        copied = point;
    }
    text.push_str(&source[copied..]);
    Terminated {
        text,
        offsets: OffsetMap { inserted },
    }
}

/// End of the interpreted string or rune literal starting at `start`. An unterminated literal
/// stops before the line break.
fn quoted_end(bytes: &[u8], start: usize) -> usize {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\n' => return i,
            c if c == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

fn number_end(bytes: &[u8], start: usize) -> usize {
    let hex = bytes[start] == b'0' && matches!(bytes.get(start + 1), Some(b'x' | b'X'));
    let exponent: &[u8] = if hex { b"pP" } else { b"eE" };
    let mut i = start;
    while i < bytes.len() {
        let c = bytes[i];
        if c.is_ascii_alphanumeric() || c == b'_' || c == b'.' {
            i += 1;
        } else if (c == b'+' || c == b'-') && i > start && exponent.contains(&bytes[i - 1]) {
            i += 1;
        } else {
            break;
        }
    }
    i
}

fn word_end(source: &str, start: usize) -> usize {
    source[start..]
        .char_indices()
        .find(|&(_, c)| !(c.is_alphanumeric() || c == '_'))
        .map_or(source.len(), |(offset, _)| start + offset)
}
