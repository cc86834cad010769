//! Canonical URL mapping
//!
//! Every note is keyed by a canonical URL: lower-case slug segments, a leading
//! and a trailing `/`. URL equality is plain string equality, so every path
//! into the registry (file discovery, wikilink targets, frontmatter overrides,
//! aggregate pages) goes through the functions in this module.

use std::path::{Component, Path};

/// URL of the site root
pub const ROOT_URL: &str = "/";

/// Separator every collapsed run of unsafe characters turns into
const SLUG_SEPARATOR: char = '_';

fn is_separator(ch: char) -> bool {
    ch.is_whitespace()
        || ch.is_control()
        || matches!(
            ch,
            '_' | '/' | '\\' | '?' | '%' | '*' | ':' | '|' | '"' | '<' | '>' | '#' | '[' | ']' | '^'
        )
}

/// Normalize one path segment.
///
/// Lower-cases the input and collapses every run of whitespace, control
/// characters, `_` and characters that are unsafe in file names or URLs into a
/// single `_`. All other characters are kept as-is. Total over Unicode: an
/// input that normalizes to nothing yields `_`.
pub fn slugify(segment: &str) -> String {
    let mut slug = String::with_capacity(segment.len());
    for ch in segment.chars().flat_map(char::to_lowercase) {
        if is_separator(ch) {
            if !slug.ends_with(SLUG_SEPARATOR) {
                slug.push(SLUG_SEPARATOR);
            }
        } else {
            slug.push(ch);
        }
    }

    if slug.is_empty() {
        slug.push(SLUG_SEPARATOR);
    }
    slug
}

/// Join slug segments into canonical form
fn join_segments<I, S>(segments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut url = String::from(ROOT_URL);
    for segment in segments {
        url.push_str(segment.as_ref());
        url.push('/');
    }
    url
}

/// Map a path relative to the content root to its canonical URL.
///
/// Directories become leading segments; the file stem becomes the last one,
/// unless it equals `index_name`, in which case the directory alone is the URL.
///
/// ```
/// use garden_core::url::path_to_url;
/// use std::path::Path;
///
/// assert_eq!(path_to_url(Path::new("topics/My Note.md"), "index"), "/topics/my_note/");
/// assert_eq!(path_to_url(Path::new("topics/sub/index.md"), "index"), "/topics/sub/");
/// ```
pub fn path_to_url(relative: &Path, index_name: &str) -> String {
    let mut segments: Vec<String> = relative
        .parent()
        .into_iter()
        .flat_map(Path::components)
        .filter_map(|c| match c {
            Component::Normal(name) => Some(slugify(&name.to_string_lossy())),
            _ => None,
        })
        .collect();

    if let Some(stem) = relative.file_stem() {
        let stem = stem.to_string_lossy();
        if !stem.eq_ignore_ascii_case(index_name) {
            segments.push(slugify(&stem));
        }
    }

    join_segments(segments)
}

/// Canonicalize a wikilink target so it meets the URL of the file it names.
///
/// Drops `#heading` / `#^block` references and a `.md` suffix, ignores a
/// leading `/` and maps a trailing index segment to its directory. Returns
/// `None` for a pure same-page reference such as `[[#section]]`.
pub fn link_to_url(target: &str, index_name: &str) -> Option<String> {
    let target = target.split('#').next().unwrap_or_default().trim();
    if target.is_empty() {
        return None;
    }

    let target = strip_suffix_ignore_case(target, ".md").unwrap_or(target);
    let mut segments: Vec<&str> = target
        .split('/')
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();

    if segments
        .last()
        .is_some_and(|last| last.eq_ignore_ascii_case(index_name))
    {
        segments.pop();
    }

    Some(join_segments(segments.into_iter().map(slugify)))
}

fn strip_suffix_ignore_case<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    let split = s.len().checked_sub(suffix.len())?;
    if s.is_char_boundary(split) && s[split..].eq_ignore_ascii_case(suffix) {
        Some(&s[..split])
    } else {
        None
    }
}

/// Canonicalize a frontmatter `url` value
pub fn canonicalize_url(raw: &str) -> String {
    join_segments(
        raw.split('/')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(slugify),
    )
}

/// Apply frontmatter overrides to a computed URL.
///
/// `url` replaces the whole key; otherwise `slug` replaces the last segment.
pub fn apply_override(computed: &str, url: Option<&str>, slug: Option<&str>) -> String {
    if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
        return canonicalize_url(url);
    }

    match slug.filter(|s| !s.trim().is_empty()) {
        Some(slug) => {
            let mut segments: Vec<&str> = computed.split('/').filter(|s| !s.is_empty()).collect();
            segments.pop();
            let slug = slugify(slug.trim());
            join_segments(segments.into_iter().map(str::to_string).chain([slug]))
        }
        None => computed.to_string(),
    }
}

/// Derive a display title from a canonical URL (`/my_note/` -> `My note`)
pub fn title_from_url(url: &str) -> String {
    let Some(last) = url.split('/').filter(|s| !s.is_empty()).last() else {
        return "Index".to_string();
    };

    let words = last.replace(SLUG_SEPARATOR, " ");
    let words = words.trim();
    let mut chars = words.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => "Index".to_string(),
    }
}

/// URL of the aggregate page for a tag key (nested tags nest in the URL)
pub fn tag_url(key: &str) -> String {
    let segments: Vec<String> = key
        .split('/')
        .filter(|s| !s.is_empty())
        .map(slugify)
        .collect();
    format!("/tags{}", join_segments(segments))
}

/// URL of the aggregate page for a citation key
pub fn citation_url(key: &str) -> String {
    format!("/citations/{}/", slugify(key))
}
