//! Path encoding, base-path handling and anchor-click interception.

use percent_encoding::{
    percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC,
};
use sprig_dom::AnchorClick;

/// Characters left alone by `encodeURIComponent`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encodes a path segment value.
pub fn escape(s: &str) -> String {
    utf8_percent_encode(s, COMPONENT).to_string()
}

/// Decodes a percent-encoded value. Returns `None` if the decoded bytes are
/// not UTF-8.
pub fn unescape(s: &str) -> Option<String> {
    percent_decode_str(s)
        .decode_utf8()
        .ok()
        .map(|s| s.into_owned())
}

/// Normalizes a base path: one leading slash, no trailing slash. The root
/// (`""` or `"/"`) normalizes to the empty string, meaning "no base".
pub fn normalize_base(base: &str) -> String {
    let trimmed = base.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

/// Removes `base` from the front of a browser path. Paths outside the base
/// are returned unchanged.
pub fn strip_base(base: &str, path: &str) -> String {
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };
    if base.is_empty() {
        return path;
    }
    match path.strip_prefix(base) {
        Some("") => "/".to_string(),
        Some(rest) if rest.starts_with('/') => rest.to_string(),
        _ => path,
    }
}

/// Prefixes a router path with `base` for display in the address bar.
pub fn join_base(base: &str, path: &str) -> String {
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

/// Extracts a base path from a `<base href>` value, resolving it against
/// the page origin when it is relative.
pub fn base_from_href(href: &str, origin: &str) -> Option<String> {
    let url = match url::Url::parse(href) {
        Ok(url) => url,
        Err(_) => url::Url::parse(origin).ok()?.join(href).ok()?,
    };
    Some(normalize_base(url.path()))
}

/// Decides whether a click should become a client-side navigation, and to
/// which browser path.
///
/// The browser keeps the click if it was already handled, used a
/// non-primary button or a modifier key, targets another browsing context,
/// is a download or `rel="external"`, leaves the origin, or leaves the base.
pub fn intercept(click: &AnchorClick, origin: &str, base: &str) -> Option<String> {
    if click.default_prevented || click.button != 0 || click.modifier {
        return None;
    }
    if click.target.as_deref().is_some_and(|t| !t.is_empty()) || click.download {
        return None;
    }
    if click
        .rel
        .as_deref()
        .is_some_and(|rel| rel.split([' ', '\t']).any(|p| p == "external"))
    {
        return None;
    }
    if click.href.is_empty() {
        return None;
    }

    let origin_url = url::Url::parse(origin).ok()?;
    let url = match url::Url::parse(&click.href) {
        Ok(url) => url,
        Err(_) => origin_url.join(&click.href).ok()?,
    };
    if url.origin() != origin_url.origin() {
        return None;
    }

    let path = url.path();
    if !base.is_empty() && path != base && !path.starts_with(&format!("{base}/"))
    {
        return None;
    }
    Some(path.to_string())
}
