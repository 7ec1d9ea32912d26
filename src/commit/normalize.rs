//! Cleanup of raw provider output into a commit message.
//!
//! Models frequently return JSON-escaped text (`\n` as two characters) or
//! markdown-escaped punctuation. Escapes are resolved in a single
//! left-to-right scan so an escape produced by one rule is never re-read
//! by another.

const FENCE: &str = "```";

/// Normalize raw provider text.
///
/// - `\n` becomes a newline and `\r` is dropped
/// - a backslash before ASCII punctuation (other than a backslash) is dropped
/// - `\\` and backslashes before anything else are kept
/// - surrounding whitespace is trimmed
/// - a message wrapped entirely in a code fence is unwrapped
///
/// `normalize(&normalize(x)) == normalize(x)` for every input.
pub fn normalize(raw: &str) -> String {
    let text = unescape(raw).trim().to_string();
    unwrap_fence(&text).unwrap_or(text)
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some('n') => {
                chars.next();
                out.push('\n');
            }
            Some('r') => {
                chars.next();
            }
            Some('\\') => {
                chars.next();
                out.push_str("\\\\");
            }
            Some(next) if next.is_ascii_punctuation() => {
                chars.next();
                out.push(next);
            }
            _ => out.push('\\'),
        }
    }
    out
}

/// Contents of a text that is one fenced block, trimmed.
fn unwrap_fence(text: &str) -> Option<String> {
    let rest = text.strip_prefix(FENCE)?;
    let body = rest.strip_suffix(FENCE)?;
    // The opening line may carry a language tag
    let body = match body.split_once('\n') {
        Some((tag, inner)) if !tag.trim().contains(char::is_whitespace) => inner,
        _ => body,
    };
    if body.contains(FENCE) {
        return None;
    }
    Some(body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_newlines() {
        assert_eq!(
            normalize("fix(auth): handle expiry\\n\\n- Return 401\\r\\n- Log id"),
            "fix(auth): handle expiry\n\n- Return 401\n- Log id"
        );
    }

    #[test]
    fn test_escaped_punctuation() {
        assert_eq!(normalize("feat\\(api\\): add \\`v2\\` routes\\."), "feat(api): add `v2` routes.");
        assert_eq!(normalize("fix: handle \\\"quoted\\\" input"), "fix: handle \"quoted\" input");
    }

    #[test]
    fn test_backslashes_kept() {
        assert_eq!(normalize("fix: windows path C:\\\\Users"), "fix: windows path C:\\\\Users");
        assert_eq!(normalize("fix: regex \\d+ and \\w"), "fix: regex \\d+ and \\w");
        assert_eq!(normalize("trailing \\"), "trailing \\");
    }

    #[test]
    fn test_trims_whitespace() {
        assert_eq!(normalize("\n\n  chore: bump deps  \n"), "chore: bump deps");
    }

    #[test]
    fn test_unwraps_code_fence() {
        assert_eq!(
            normalize("```\nfeat(ui): add dark mode\n\n- toggle in settings\n```"),
            "feat(ui): add dark mode\n\n- toggle in settings"
        );
        assert_eq!(normalize("```text\ndocs: fix typo\n```"), "docs: fix typo");
        assert_eq!(normalize("  ```\nstyle: format\n```  \n"), "style: format");
    }

    #[test]
    fn test_partial_fence_is_kept() {
        let text = "feat: add example\n\n```rust\nfn main() {}\n```";
        assert_eq!(normalize(text), text);
    }

    #[test]
    fn test_empty_results() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("  \\n\\r  "), "");
        assert_eq!(normalize("```\n```"), "");
    }

    #[test]
    fn test_idempotent() {
        let corpus = [
            "fix: a\\nb",
            "\\\\n",
            "\\\\\\n",
            "a\\\\\\\\b",
            "\\\\(x\\\\)",
            "\\(\\)",
            "x\\",
            "x\\\\",
            "\\\\\\",
            "```\\n```",
            "```\nfix: a\\n\n```",
            "``` \n```",
            "\\r\\r\\n",
            "\\`\\`\\`\nfeat: x\n\\`\\`\\`",
            "  \\ \\t ",
            "feat: ünïcödé \\é",
            "```\n```\n```",
            "\\\\\\\\\\",
        ];
        for input in corpus {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {input:?}");
        }
    }
}
