//! Escape sequences for writing delimiter-colliding text without quoting.
//!
//! With escape character `\`, a newline becomes `\n`, a tab `\t`, and each of
//! `,` `|` `;` is prefixed with `\`. The escape character itself is doubled.

/// Characters that are escaped as `<esc><char>` regardless of the active delimiter.
const ESCAPED_LITERALS: [char; 3] = [',', '|', ';'];

/// Escapes the escape character, newlines, tabs and the common delimiters.
pub fn escape(text: &str, escape_char: char) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == escape_char {
            out.push(escape_char);
            out.push(escape_char);
        } else if c == '\n' {
            out.push(escape_char);
            out.push('n');
        } else if c == '\t' {
            out.push(escape_char);
            out.push('t');
        } else if ESCAPED_LITERALS.contains(&c) {
            out.push(escape_char);
            out.push(c);
        } else {
            out.push(c);
        }
    }
    out
}

/// Whether [`escape`] rewrites `c` as an escape pair.
pub fn is_escaped(c: char) -> bool {
    c == '\n' || c == '\t' || ESCAPED_LITERALS.contains(&c)
}

/// Reverses [`escape`].
///
/// Pairs are consumed left to right, so a doubled escape character always
/// becomes one literal escape character and never combines with whatever
/// follows it. Unknown pairs and a trailing lone escape are left as they are.
pub fn unescape(text: &str, escape_char: char) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != escape_char {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(n) if n == escape_char => out.push(escape_char),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(n) if ESCAPED_LITERALS.contains(&n) => out.push(n),
            Some(n) => {
                out.push(escape_char);
                out.push(n);
            }
            None => out.push(escape_char),
        }
    }
    out
}
