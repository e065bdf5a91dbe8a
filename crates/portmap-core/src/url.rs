use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Everything `encodeURIComponent` escapes: all but ASCII alphanumerics and
/// `- _ . ! ~ * ' ( )`.
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

/// Percent-encode one URL path segment the way browsers' `encodeURIComponent`
/// does: UTF-8 bytes, upper-case hex.
pub fn encode_component(s: &str) -> String {
    utf8_percent_encode(s, COMPONENT).to_string()
}

/// `<root>/<folder>/<filename>` with every segment encoded on its own.
/// `root` is a path, not a full URL; a leading slash is kept, empty segments
/// are dropped.
pub fn media_url(root: &str, folder: &str, filename: &str) -> String {
    let path = root
        .split('/')
        .filter(|segment| !segment.is_empty())
        .chain([folder, filename])
        .map(encode_component)
        .collect::<Vec<_>>()
        .join("/");
    if root.starts_with('/') {
        format!("/{path}")
    } else {
        path
    }
}
