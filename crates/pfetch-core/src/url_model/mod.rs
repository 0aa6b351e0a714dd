//! Local file names for fetched pages.
//!
//! Url-set records normally carry their own file name; when one is missing it
//! is derived from the URL and made safe for Linux filesystems.

/// Linux NAME_MAX in bytes.
const NAME_MAX: usize = 255;

/// Extension appended when the derived name has none.
const PAGE_EXTENSION: &str = ".html";

/// Derives a file name for `url`: host plus path segments joined by `_`,
/// sanitized, with `.html` appended when the last segment has no extension.
///
/// Returns `None` when the URL does not parse or has no host.
///
/// - `https://example.com/boxscores/201904100.shtml` → `example.com_boxscores_201904100.shtml`
/// - `https://example.com/games?date=2019-04-10` → `example.com_games_date=2019-04-10.html`
pub fn file_name_for_url(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let host = parsed.host_str()?;

    let mut parts: Vec<&str> = vec![host];
    parts.extend(
        parsed
            .path()
            .split('/')
            .filter(|s| !s.is_empty() && *s != "." && *s != ".."),
    );
    let mut name = parts.join("_");
    let last_has_extension = parts.len() > 1
        && parts
            .last()
            .and_then(|s| s.rsplit_once('.'))
            .is_some_and(|(stem, ext)| !stem.is_empty() && !ext.is_empty());
    if let Some(q) = parsed.query().filter(|q| !q.is_empty()) {
        name.push('_');
        name.push_str(q);
    }

    let mut name = sanitize_file_name(&name);
    if name.is_empty() {
        return None;
    }
    if !last_has_extension || parsed.query().is_some_and(|q| !q.is_empty()) {
        truncate_to(&mut name, NAME_MAX - PAGE_EXTENSION.len());
        name.push_str(PAGE_EXTENSION);
    }
    Some(name)
}

/// Makes `name` safe as a single Linux path component.
///
/// Separators, NUL, control characters, `&` and whitespace become `_`; runs of
/// `_` collapse; leading/trailing dots and underscores are trimmed; the result
/// is capped at 255 bytes on a char boundary.
pub fn sanitize_file_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        let unsafe_char =
            matches!(c, '/' | '\\' | '\0' | '&') || c.is_control() || c.is_whitespace();
        let c = if unsafe_char { '_' } else { c };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }
    let mut out = out.trim_matches(|c| c == '.' || c == '_').to_string();
    truncate_to(&mut out, NAME_MAX);
    out
}

fn truncate_to(s: &mut String, max: usize) {
    if s.len() <= max {
        return;
    }
    let mut cut = max;
    while cut > 0 && !s.is_char_boundary(cut) {
        cut -= 1;
    }
    s.truncate(cut);
}
