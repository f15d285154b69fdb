//! Response formatter — normalizes raw completions into tidy Markdown.
//!
//! The free backends return wildly uneven text: bare fences, shouty
//! emphasis, lists glued to prose. This pass restructures it the way a chat
//! UI expects, deterministically from the text alone.
//!
//! Every rule operates **outside** fenced code regions: the text is split on
//! the ``` delimiter and only the non-code segments are transformed, so code
//! bytes survive untouched. Applying the formatter to its own output yields
//! the same text again (the chat page re-renders stored responses through it).
//!
//! Passes, in order:
//! 1. Normalize code fences (with or without a language tag)
//! 2. Tidy short inline-code spans
//! 3. Line pass: promote heading-like lines, bulletize list-adjacent lines
//! 4. Emphasis: bold label words, bold ALL-CAPS runs
//! 5. Collapse 3+ newlines to 2
//! 6. Trim the whole text

use regex::Regex;

/// Heading promotion fires only when the line carries one of these stems.
const TITLE_KEYWORDS: &[&str] = &[
    "example",
    "result",
    "output",
    "explanation",
    "solution",
    "answer",
    "usage",
    "concept",
    "summary",
    "step",
];

/// Format a raw completion into structured Markdown.
pub fn format_response(raw: &str) -> String {
    if raw.is_empty() {
        return raw.to_string();
    }

    // 1. Canonical fences: ```lang\nbody\n``` with exactly one newline on
    //    each side of the body.
    let re_fence = Regex::new(r"(?s)```([A-Za-z0-9_+-]*)[ \t]*\n?(.*?)\n?```").unwrap();
    let text = re_fence
        .replace_all(raw, |caps: &regex::Captures| {
            let lang = &caps[1];
            let body = &caps[2];
            if lang.is_empty() {
                format!("```\n{body}\n```")
            } else {
                format!("```{lang}\n{body}\n```")
            }
        })
        .into_owned();

    // 2. Inline code: trim padding inside short single-line spans.
    let re_inline = Regex::new(r"`([^`\n]+)`").unwrap();
    let text = apply_outside_fences(&text, |segment| {
        re_inline
            .replace_all(segment, |caps: &regex::Captures| {
                let code = &caps[1];
                if code.chars().count() < 100 {
                    format!("`{}`", code.trim())
                } else {
                    caps[0].to_string()
                }
            })
            .into_owned()
    });

    // 3. Line pass (fence-aware via a toggling flag).
    let text = format_lines(&text);

    // 4. Emphasis, outside code only.
    let text = apply_outside_fences(&text, emphasize);

    // 5. Collapse runs of blank lines, outside code only.
    let re_newlines = Regex::new(r"\n{3,}").unwrap();
    let text = apply_outside_fences(&text, |segment| {
        re_newlines.replace_all(segment, "\n\n").into_owned()
    });

    // 6. Trim.
    text.trim().to_string()
}

/// Split on the ``` delimiter and run `f` over the non-code segments only.
/// Segments at even indices are outside fences; odd ones are code.
fn apply_outside_fences(text: &str, f: impl Fn(&str) -> String) -> String {
    text.split("```")
        .enumerate()
        .map(|(i, segment)| {
            if i % 2 == 0 {
                f(segment)
            } else {
                segment.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("```")
}

fn is_numbered_item(line: &str) -> bool {
    let re = Regex::new(r"^\d+\.\s+").unwrap();
    re.is_match(line)
}

fn is_bullet_item(line: &str) -> bool {
    let re = Regex::new(r"^[-*+]\s+").unwrap();
    re.is_match(line)
}

/// Heading-like: ends with `:`, short, not already a heading, few words,
/// carries a title keyword, and isn't an all-caps label (those are bolded by
/// the emphasis pass instead).
fn is_heading_like(stripped: &str) -> bool {
    stripped.ends_with(':')
        && stripped.chars().count() < 80
        && !stripped.starts_with('#')
        && stripped.split_whitespace().count() <= 8
        && stripped.chars().any(|c| c.is_lowercase())
        && {
            let lower = stripped.to_lowercase();
            TITLE_KEYWORDS.iter().any(|kw| lower.contains(kw))
        }
}

/// The per-line structural pass: heading promotion and bulletization of
/// short lines living next to list items. Lines inside fences pass through.
fn format_lines(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut formatted: Vec<String> = Vec::with_capacity(lines.len());
    let mut in_code_block = false;

    for (i, line) in lines.iter().enumerate() {
        let stripped = line.trim();

        if stripped.starts_with("```") {
            in_code_block = !in_code_block;
            formatted.push(line.to_string());
            continue;
        }
        if in_code_block {
            formatted.push(line.to_string());
            continue;
        }

        if is_heading_like(stripped) {
            formatted.push(format!("## {stripped}"));
        } else if is_numbered_item(stripped) || is_bullet_item(stripped) {
            formatted.push(line.to_string());
        } else if !stripped.is_empty()
            && !stripped.starts_with('#')
            && stripped.chars().count() < 200
        {
            // A short plain line squeezed between list items reads as a
            // stray item; fold it into the list.
            let prev_is_item = formatted
                .last()
                .map(|p| {
                    let p = p.trim();
                    is_numbered_item(p) || is_bullet_item(p)
                })
                .unwrap_or(false);
            let next_is_item = lines
                .get(i + 1)
                .map(|n| {
                    let n = n.trim();
                    is_numbered_item(n) || is_bullet_item(n)
                })
                .unwrap_or(false);

            if (prev_is_item || next_is_item) && stripped.split_whitespace().count() < 15 {
                formatted.push(format!("- {stripped}"));
            } else {
                formatted.push(line.to_string());
            }
        } else {
            formatted.push(line.to_string());
        }
    }

    formatted.join("\n")
}

/// Bold label words and ALL-CAPS runs.
///
/// `regex` has no lookbehind, so both patterns capture a one-character guard
/// before the target and reinsert it; the guard also rejects text that is
/// already bolded, which keeps this pass idempotent.
fn emphasize(segment: &str) -> String {
    // Labels first, so "RESULT:" becomes one bold label rather than a bold
    // word with a dangling colon.
    let re_label = Regex::new(
        r"(^|[^*\w])(Result|RESULT|Output|OUTPUT|Example|EXAMPLE|Conclusion|CONCLUSION):\s*",
    )
    .unwrap();
    let text = re_label.replace_all(segment, "$1**$2:**\n").into_owned();

    // Runs of 3+-letter uppercase words. The trailing guard mirrors the
    // leading one: a run butting against `*` is already emphasized.
    let re_caps =
        Regex::new(r"(^|[^*\w])([A-Z]{3,}(?:[ \t]+[A-Z]{3,})*)($|[^*\w])").unwrap();
    re_caps.replace_all(&text, "$1**$2**$3").into_owned()
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
