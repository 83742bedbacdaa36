/// A `$N` marker found outside literals and comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct DollarPlaceholder {
    /// Byte offset of the `$`.
    pub start: usize,
    /// Byte offset one past the last digit.
    pub end: usize,
    /// The 1-based parameter number `N`.
    pub index: usize,
}

#[derive(Clone, Copy)]
enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    LineComment,
    BlockComment(u32),
}

/// All `$N` markers of `sql`, in source order.
///
/// Markers inside `'...'` strings, `"..."` identifiers and comments are not placeholders.
pub(super) fn dollar_placeholders(sql: &str) -> Vec<DollarPlaceholder> {
    let bytes = sql.as_bytes();
    let mut found = Vec::new();
    let mut state = State::Normal;
    let mut idx = 0;

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                b'-' if bytes.get(idx + 1) == Some(&b'-') => {
                    state = State::LineComment;
                    idx += 1;
                }
                b'/' if bytes.get(idx + 1) == Some(&b'*') => {
                    state = State::BlockComment(1);
                    idx += 1;
                }
                b'$' => {
                    if let Some((digits_end, index)) = scan_index(bytes, idx + 1) {
                        found.push(DollarPlaceholder {
                            start: idx,
                            end: digits_end,
                            index,
                        });
                        idx = digits_end;
                        continue;
                    }
                }
                _ => {}
            },
            State::SingleQuoted => {
                if b == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        idx += 1; // skip escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::DoubleQuoted => {
                if b == b'"' {
                    if bytes.get(idx + 1) == Some(&b'"') {
                        idx += 1;
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if b == b'/' && bytes.get(idx + 1) == Some(&b'*') {
                    state = State::BlockComment(depth + 1);
                    idx += 1;
                } else if b == b'*' && bytes.get(idx + 1) == Some(&b'/') {
                    state = if depth == 1 {
                        State::Normal
                    } else {
                        State::BlockComment(depth - 1)
                    };
                    idx += 1;
                }
            }
        }
        idx += 1;
    }

    found
}

fn scan_index(bytes: &[u8], start: usize) -> Option<(usize, usize)> {
    let mut idx = start;
    while idx < bytes.len() && bytes[idx].is_ascii_digit() {
        idx += 1;
    }
    if idx == start {
        return None;
    }
    let digits = std::str::from_utf8(&bytes[start..idx]).ok()?;
    digits.parse().ok().map(|index| (idx, index))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indexes(sql: &str) -> Vec<usize> {
        dollar_placeholders(sql).iter().map(|p| p.index).collect()
    }

    #[test]
    fn finds_markers_in_source_order() {
        assert_eq!(indexes("a = $2 AND b = $1 AND c = $2"), vec![2, 1, 2]);
        assert_eq!(indexes("VALUES ($10, $1)"), vec![10, 1]);
    }

    #[test]
    fn offsets_cover_marker() {
        let sql = "x = $12)";
        let found = dollar_placeholders(sql);
        assert_eq!(&sql[found[0].start..found[0].end], "$12");
    }

    #[test]
    fn ignores_literals_and_comments() {
        let sql = "SELECT '$1', \"$2\" -- $3\n/* $4 /* $5 */ */ FROM t WHERE a = $6";
        assert_eq!(indexes(sql), vec![6]);
        assert_eq!(indexes("SELECT 'it''s $1' , $2"), vec![2]);
    }

    #[test]
    fn bare_dollar_is_not_a_marker() {
        assert!(indexes("SELECT '$' || price$ FROM t").is_empty());
    }
}
