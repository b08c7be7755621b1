//! Ecosystem module support.
//!
//! Process managers conventionally keep their descriptor in a JavaScript
//! module:
//!
//! ```text
//! module.exports = {
//!   apps: [
//!     { name: "api", script: "./bin/api", watch: ["."], }, // comment
//!   ]
//! }
//! ```
//!
//! Only the object-literal subset is accepted. It is rewritten to JSON:
//! comments dropped, identifier keys quoted, single-quoted and backtick
//! strings re-quoted (`\x41`, `\0`, `\v` and line continuations
//! translated), `0x` numbers written in decimal, trailing commas removed,
//! and the export prefix and final `;` stripped. Anything that needs a JavaScript engine (calls,
//! variables, `${}` interpolation) is left as-is and fails the JSON parse.

use crate::error::LoadError;
use regex::Regex;

const EXPORT_PREFIX_RE: &str =
    r#"^\s*(?:"use strict"\s*;?\s*)?(?:module\.exports\s*=|export\s+default)\s*"#;

/// Rewrite an ecosystem module into JSON text.
pub fn to_json(source: &str) -> Result<String, LoadError> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    let body = rewrite_literal(source)?;

    let prefix = Regex::new(EXPORT_PREFIX_RE).map_err(LoadError::malformed)?;
    let body = match prefix.find(&body) {
        Some(m) => &body[m.end()..],
        None => body.as_str(),
    };
    let body = body.trim_end().trim_end_matches(';').trim_end();

    Ok(body.to_string())
}

fn rewrite_literal(source: &str) -> Result<String, LoadError> {
    let chars: Vec<char> = source.chars().collect();
    let mut out = String::with_capacity(source.len() + source.len() / 8);
    // Last non-whitespace char written; decides whether an identifier is a key.
    let mut last: Option<char> = None;
    let mut line = 1usize;
    let mut i = 0usize;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\n' => {
                line += 1;
                out.push(c);
                i += 1;
            }
            '/' if chars.get(i + 1) == Some(&'/') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                let start = line;
                i += 2;
                loop {
                    match chars.get(i) {
                        None => {
                            return Err(LoadError::malformed(format!(
                                "unterminated block comment starting on line {}",
                                start
                            )));
                        }
                        Some('*') if chars.get(i + 1) == Some(&'/') => {
                            i += 2;
                            break;
                        }
                        Some('\n') => {
                            // Keep line numbers aligned for JSON parse errors.
                            out.push('\n');
                            line += 1;
                            i += 1;
                        }
                        Some(_) => i += 1,
                    }
                }
            }
            '"' | '\'' | '`' => {
                let start_line = line;
                i = read_string(&chars, i, &mut line, &mut out)?;
                // Re-emit swallowed newlines as whitespace so later JSON
                // errors still point at the right line.
                for _ in start_line..line {
                    out.push('\n');
                }
                last = Some('"');
            }
            '0' if matches!(chars.get(i + 1), Some('x') | Some('X')) => {
                i = read_hex_number(&chars, i, line, &mut out)?;
                last = Some('0');
            }
            ',' => {
                let next = next_significant(&chars, i + 1);
                if !matches!(next, Some('}') | Some(']')) {
                    out.push(',');
                    last = Some(',');
                }
                i += 1;
            }
            c if is_ident_start(c) => {
                let start = i;
                while i < chars.len() && is_ident_part(chars[i]) {
                    i += 1;
                }
                let ident: String = chars[start..i].iter().collect();
                let is_key = matches!(last, Some('{') | Some(','))
                    && next_significant(&chars, i) == Some(':');
                if is_key {
                    out.push('"');
                    out.push_str(&ident);
                    out.push('"');
                } else {
                    out.push_str(&ident);
                }
                last = ident.chars().last();
            }
            c => {
                out.push(c);
                if !c.is_whitespace() {
                    last = Some(c);
                }
                i += 1;
            }
        }
    }

    Ok(out)
}

/// Copy one string literal starting at `chars[start]` into `out` as a JSON
/// string. Returns the index just past the closing quote; `line` advances
/// past any newlines inside the literal.
fn read_string(
    chars: &[char],
    start: usize,
    line: &mut usize,
    out: &mut String,
) -> Result<usize, LoadError> {
    let quote = chars[start];
    let mut i = start + 1;
    out.push('"');

    loop {
        let Some(&c) = chars.get(i) else {
            return Err(unterminated(*line));
        };
        match c {
            c if c == quote => {
                out.push('"');
                return Ok(i + 1);
            }
            '\\' => {
                let Some(&escaped) = chars.get(i + 1) else {
                    return Err(unterminated(*line));
                };
                i += 2;
                match escaped {
                    // Line continuation.
                    '\n' => *line += 1,
                    '\r' => {
                        if chars.get(i) == Some(&'\n') {
                            i += 1;
                        }
                        *line += 1;
                    }
                    'x' => {
                        let hex: String =
                            chars.get(i..i + 2).unwrap_or_default().iter().collect();
                        let code = u8::from_str_radix(&hex, 16).map_err(|_| {
                            LoadError::malformed(format!(
                                "bad \\x escape {:?} on line {}",
                                hex, *line
                            ))
                        })?;
                        out.push_str(&format!("\\u{:04x}", code));
                        i += 2;
                    }
                    '0' if !chars.get(i).is_some_and(char::is_ascii_digit) => {
                        out.push_str("\\u0000");
                    }
                    'v' => out.push_str("\\u000b"),
                    '"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't' | 'u' => {
                        out.push('\\');
                        out.push(escaped);
                    }
                    // Any other escaped char stands for itself.
                    other => push_json_char(out, other),
                }
            }
            '$' if quote == '`' && chars.get(i + 1) == Some(&'{') => {
                return Err(LoadError::malformed(format!(
                    "template interpolation on line {} needs a JavaScript runtime",
                    *line
                )));
            }
            '\n' if quote == '`' => {
                out.push_str("\\n");
                *line += 1;
                i += 1;
            }
            '\n' => return Err(unterminated(*line)),
            c => {
                push_json_char(out, c);
                i += 1;
            }
        }
    }
}

fn push_json_char(out: &mut String, c: char) {
    match c {
        '"' => out.push_str("\\\""),
        '\t' => out.push_str("\\t"),
        '\r' => out.push_str("\\r"),
        c => out.push(c),
    }
}

fn unterminated(line: usize) -> LoadError {
    LoadError::malformed(format!("unterminated string on line {}", line))
}

/// Rewrite a `0x` literal starting at `chars[start]` as decimal. Returns the
/// index just past it.
fn read_hex_number(
    chars: &[char],
    start: usize,
    line: usize,
    out: &mut String,
) -> Result<usize, LoadError> {
    let mut i = start + 2;
    while i < chars.len() && chars[i].is_ascii_hexdigit() {
        i += 1;
    }
    let digits: String = chars[start + 2..i].iter().collect();
    let value = u64::from_str_radix(&digits, 16)
        .map_err(|_| LoadError::malformed(format!("bad hex number on line {}", line)))?;
    out.push_str(&value.to_string());
    Ok(i)
}

/// First char at or after `from` that is neither whitespace nor inside a comment.
fn next_significant(chars: &[char], from: usize) -> Option<char> {
    let mut i = from;
    while i < chars.len() {
        match chars[i] {
            c if c.is_whitespace() => i += 1,
            '/' if chars.get(i + 1) == Some(&'/') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                i += 2;
                while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                    i += 1;
                }
                i += 2;
            }
            c => return Some(c),
        }
    }
    None
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_part(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    fn parse(src: &str) -> Value {
        serde_json::from_str(&to_json(src).unwrap()).unwrap()
    }

    #[test]
    fn rewrites_module_exports() {
        let src = r#"
module.exports = {
  apps: [
    {
      name: "moniplan-api",
      script: "/usr/local/go/bin/go",
      args: "run main.go",
      watch: ["."],
      interpreter: "none",
      env: {
        GO111MODULE: "on"
      }
    }
  ]
}
"#;
        assert_eq!(
            parse(src),
            json!({"apps": [{
                "name": "moniplan-api",
                "script": "/usr/local/go/bin/go",
                "args": "run main.go",
                "watch": ["."],
                "interpreter": "none",
                "env": {"GO111MODULE": "on"}
            }]})
        );
    }

    #[test]
    fn handles_comments_quotes_and_trailing_commas() {
        let src = r#"
// managed processes
export default {
  /* one app */
  apps: [
    { name: 'it\'s', script: 'say "hi"', args: ['a', `b`,], watch: false, }, // done
  ],
};
"#;
        assert_eq!(
            parse(src),
            json!({"apps": [{
                "name": "it's",
                "script": "say \"hi\"",
                "args": ["a", "b"],
                "watch": false
            }]})
        );
    }

    #[test]
    fn bare_object_literal_is_accepted() {
        assert_eq!(parse("{apps: []}"), json!({"apps": []}));
    }

    #[test]
    fn values_that_look_like_keys_are_untouched() {
        let v = parse(r#"{apps: [{name: "a:b", script: "x", interpreter: "none"}]}"#);
        assert_eq!(v["apps"][0]["name"], json!("a:b"));
    }

    #[test]
    fn template_interpolation_is_rejected() {
        let err = to_json("module.exports = { apps: [{ name: `${NAME}` }] }").unwrap_err();
        assert!(err.is_malformed());
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn unterminated_comment_is_rejected() {
        let err = to_json("{ apps: [] }\n/* trailing").unwrap_err();
        assert!(err.to_string().contains("block comment starting on line 2"));
    }

    #[test]
    fn leading_byte_order_mark_is_ignored() {
        let src = "\u{feff}module.exports = { apps: [] };\n";
        assert_eq!(parse(src), json!({"apps": []}));
    }

    #[test]
    fn multiline_template_keeps_line_numbers() {
        let src = "module.exports = {\n  apps: [{ name: `a\nb\nc`,\n    script: `${BIN}` }]\n}";
        let err = to_json(src).unwrap_err();
        assert!(err.to_string().contains("line 5"), "{}", err);

        // JSON errors after the literal line up with the source too.
        let json = to_json("{ apps: [{ name: `a\nb`,\n  script: \"x\" }] }\n").unwrap();
        assert_eq!(json.lines().count(), 3);
        assert_eq!(
            serde_json::from_str::<Value>(&json).unwrap()["apps"][0]["name"],
            json!("a\nb")
        );
    }

    #[test]
    fn javascript_escapes_and_hex_numbers() {
        let src = "{ apps: [{ name: 'A\\x41\\\n-\\q', port: 0x1F, tab: '\t' }] }";
        assert_eq!(
            parse(src),
            json!({"apps": [{"name": "AA-q", "port": 31, "tab": "\t"}]})
        );
    }

    #[test]
    fn bad_hex_escape_is_rejected() {
        let err = to_json(r"{ apps: [{ name: '\xZZ' }] }").unwrap_err();
        assert!(err.is_malformed());
        assert!(err.to_string().contains("line 1"));
    }
}
