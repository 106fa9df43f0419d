#[derive(Clone, Copy, PartialEq, Eq)]
pub(super) enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    Backticked,
    Bracketed,
    LineComment,
    BlockComment,
}

pub(super) fn scan_digits(bytes: &[u8], start: usize) -> Option<(usize, &str)> {
    let mut idx = start;
    while idx < bytes.len() && bytes[idx].is_ascii_digit() {
        idx += 1;
    }
    if idx == start {
        None
    } else {
        std::str::from_utf8(&bytes[start..idx])
            .ok()
            .map(|digits| (idx, digits))
    }
}

pub(super) fn scan_ident(bytes: &[u8], start: usize) -> (usize, &str) {
    let mut idx = start;
    while idx < bytes.len() && super::parsers::is_ident_char(bytes[idx]) {
        idx += 1;
    }
    // ASCII-only run, always valid UTF-8
    (idx, std::str::from_utf8(&bytes[start..idx]).unwrap_or_default())
}
