// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Content sanitization applied when a `<boltAction>` closes, per the spec's rules: trim, strip
//! fenced-code wrappers and unescape entities (unless the target path is Markdown), append a
//! trailing newline.

/// Sanitize a closed action's accumulated content.
///
/// `file_path` is `None` for shell actions (which always go through the strip/unescape path) and
/// `Some(path)` for file actions, which skip stripping when `path` ends in `.md` — Markdown
/// content legitimately contains fenced code blocks and HTML entities that must survive verbatim.
pub fn sanitize_content(raw: &str, file_path: Option<&str>) -> String {
    let trimmed = raw.trim();
    let is_markdown = file_path.map(|p| p.ends_with(".md")).unwrap_or(false);

    let mut content = if is_markdown {
        trimmed.to_string()
    } else {
        let stripped = strip_fences(trimmed);
        unescape(&stripped)
    };
    content.push('\n');
    content
}

/// Strip a single outer fenced-code wrapper: triple-backtick (with an optional language tag on
/// the opening line) or CDATA. Only removed when it wraps the *entire* content, not fences
/// appearing inside it.
fn strip_fences(s: &str) -> String {
    if let Some(rest) = s.strip_prefix("```") {
        let after_lang = rest.find('\n').map(|i| &rest[i + 1..]).unwrap_or(rest);
        let body = after_lang.strip_suffix("```").unwrap_or(after_lang);
        return body.trim().to_string();
    }
    if let Some(rest) = s.strip_prefix("<![CDATA[") {
        let body = rest.strip_suffix("]]>").unwrap_or(rest);
        return body.trim().to_string();
    }
    s.to_string()
}

/// Unescape the common HTML entities and backslash escape sequences an upstream model tends to
/// emit when it has double-encoded file content. Order matters: entities first (so a literal
/// `\&lt;` becomes `\<` before the backslash pass), then escape sequences.
fn unescape(s: &str) -> String {
    let entity_pass = s
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'");

    let mut out = String::with_capacity(entity_pass.len());
    let mut chars = entity_pass.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                Some('n') => {
                    out.push('\n');
                    chars.next();
                }
                Some('t') => {
                    out.push('\t');
                    chars.next();
                }
                Some('r') => {
                    out.push('\r');
                    chars.next();
                }
                Some('"') => {
                    out.push('"');
                    chars.next();
                }
                Some('\\') => {
                    out.push('\\');
                    chars.next();
                }
                _ => out.push(c),
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_paths_skip_stripping() {
        let raw = "  ```rust\nfn x() {}\n```  ";
        assert_eq!(sanitize_content(raw, Some("README.md")), format!("{}\n", raw.trim()));
    }

    #[test]
    fn non_markdown_strips_fences_and_adds_newline() {
        let raw = "```ts\nconst x = 1;\n```";
        assert_eq!(sanitize_content(raw, Some("index.ts")), "const x = 1;\n");
    }

    #[test]
    fn strips_cdata_wrapper() {
        let raw = "<![CDATA[hello world]]>";
        assert_eq!(sanitize_content(raw, None), "hello world\n");
    }

    #[test]
    fn unescapes_entities_and_sequences() {
        let raw = "a &amp; b\\nsecond &lt;line&gt;";
        assert_eq!(sanitize_content(raw, None), "a & b\nsecond <line>\n");
    }

    #[test]
    fn shell_content_always_strips() {
        let raw = "```sh\nnpm install\n```";
        assert_eq!(sanitize_content(raw, None), "npm install\n");
    }
}
