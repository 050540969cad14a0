//! Token glomming
//!
//! Boundary tokenizers know nothing about markup or URLs, so `<b>` comes out
//! as `<`, `b`, `>` and `http://example.com` as `http`, `://`, `example`, `.`,
//! `com`. The passes here put such runs back together.
//!
//! All passes are a single forward walk over the token list. When a token has
//! to be split, the remainder is carried over as the next token to look at.

use std::sync::LazyLock;

use regex::Regex;

static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^<>]*>").expect("tag pattern is valid"));

/// Remove markup from text before tokenizing
///
/// Complete tags are replaced with a space, so words on either side of a tag
/// stay separate tokens. Any angle bracket left over after that belongs to a
/// broken tag and is removed, so no token produced from the result can
/// contain `<` or `>`.
pub fn strip_tags(text: &str) -> String {
    TAG_PATTERN.replace_all(text, " ").replace(['<', '>'], "")
}

/// A token that cannot be part of a URL or email address
///
/// URLs are treated as ASCII-only, so a leading non-ASCII character ends the
/// run, as does markup or any whitespace.
fn ends_url(token: &str) -> bool {
    match token.chars().next() {
        Some('<') => true,
        Some(c) if c > '\u{7f}' => true,
        _ => token.chars().any(char::is_whitespace),
    }
}

/// Merge tokens split in the middle of a URL or email address
///
/// A `://` or `@` token starts a run, pulling back the previous token as its
/// prefix (`http` + `://`, `user` + `@`). The run then absorbs tokens until
/// one of them ends it (see [`ends_url`]); that token is kept as is.
///
/// # Example
///
/// ```ignore
/// let tokens = ["see", " ", "http", "://", "a", ".", "org", " ", "now"];
/// let glommed = glom_urls(tokens.iter().map(|t| t.to_string()).collect());
/// assert_eq!(glommed, ["see", " ", "http://a.org", " ", "now"]);
/// ```
pub fn glom_urls(tokens: Vec<String>) -> Vec<String> {
    let mut result: Vec<String> = Vec::with_capacity(tokens.len());
    let mut url: Option<String> = None;

    for token in tokens {
        match url.take() {
            Some(mut run) => {
                if ends_url(&token) {
                    result.push(run);
                    result.push(token);
                } else {
                    run.push_str(&token);
                    url = Some(run);
                }
            }
            None => {
                if token == "://" || token == "@" {
                    let mut run = result.pop().unwrap_or_default();
                    run.push_str(&token);
                    url = Some(run);
                } else {
                    result.push(token);
                }
            }
        }
    }
    if let Some(run) = url {
        result.push(run);
    }
    result
}

/// Reassemble markup tags split by a boundary tokenizer
///
/// Fragments between an opening `<` (or `</`) and the closing `>` (or `/>`)
/// are joined into one tag token; adjacent tags are then merged by
/// [`glom_multitags`]. Text glued to a bracket (`" <"`, `"> "`) is split off
/// and kept as its own token.
pub fn glom_tags(tokens: Vec<String>) -> Vec<String> {
    let mut result = Vec::with_capacity(tokens.len());
    let mut tag: Option<String> = None;
    let mut carry: Option<String> = None;
    let mut tokens = tokens.into_iter();

    while let Some(token) = carry.take().or_else(|| tokens.next()) {
        match tag.take() {
            Some(mut open) => {
                if token == ">" {
                    open.push('>');
                    result.push(open);
                } else if let Some(rest) = token.strip_prefix('>') {
                    open.push('>');
                    result.push(open);
                    carry = Some(rest.to_string());
                } else if let Some(rest) = token.strip_prefix("/>") {
                    open.push_str("/>");
                    result.push(open);
                    carry = Some(rest.to_string());
                } else {
                    open.push_str(&token);
                    tag = Some(open);
                }
            }
            None => {
                if token == "<" || token == "</" {
                    tag = Some(token);
                } else if let Some(rest) = token.strip_suffix('<') {
                    result.push(rest.to_string());
                    tag = Some("<".to_string());
                } else if let Some(rest) = token.strip_suffix("</") {
                    result.push(rest.to_string());
                    tag = Some("</".to_string());
                } else {
                    result.push(token);
                }
            }
        }
    }
    // unterminated tag at end of text
    if let Some(open) = tag {
        result.push(open);
    }
    glom_multitags(result)
}

pub fn is_tag(token: &str) -> bool {
    token.chars().count() > 2 && token.starts_with('<') && token.ends_with('>')
}

/// Merge runs of adjacent tag tokens: `<b>`, `<i>` → `<b><i>`
pub fn glom_multitags(tokens: Vec<String>) -> Vec<String> {
    let mut result = Vec::with_capacity(tokens.len());
    let mut carry: Option<String> = None;
    let mut tokens = tokens.into_iter();

    while let Some(token) = carry.take().or_else(|| tokens.next()) {
        if !is_tag(&token) {
            result.push(token);
            continue;
        }
        match tokens.next() {
            Some(next) if is_tag(&next) => carry = Some(token + &next),
            Some(next) => {
                result.push(token);
                result.push(next);
            }
            None => result.push(token),
        }
    }
    result
}
