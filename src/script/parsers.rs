pub(super) fn is_line_comment_start(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'-') && bytes.get(idx + 1) == Some(&b'-')
}

pub(super) fn is_block_comment_start(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'/') && bytes.get(idx + 1) == Some(&b'*')
}

pub(super) fn is_block_comment_end(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'*') && bytes.get(idx + 1) == Some(&b'/')
}

pub(super) fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

/// SQLite allows `$` after the first character of a bare identifier.
pub(super) fn is_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

/// Named parameter prefixes understood by SQLite: `:name`, `@name`, `$name`.
///
/// The prefix only counts at a token boundary, so `a$b` stays one identifier.
pub(super) fn is_named_param_start(bytes: &[u8], idx: usize) -> bool {
    let at_boundary = idx == 0 || !bytes.get(idx - 1).is_some_and(|b| is_ident_char(*b));
    at_boundary
        && matches!(bytes.get(idx), Some(b':' | b'@' | b'$'))
        && bytes.get(idx + 1).is_some_and(|b| is_ident_start(*b))
}
