//! SQL identifier quoting.
//!
//! Table and column names reaching the builders come from code (model
//! definitions and call-site field keys), so they are quoted but not
//! validated against an allow-list.

/// Quote an identifier: wrap in `"` and escape embedded `"` as `""`.
pub fn quote_ident(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    write_quoted(name, &mut out);
    out
}

pub(crate) fn write_quoted(name: &str, out: &mut String) {
    out.push('"');
    for ch in name.chars() {
        if ch == '"' {
            out.push('"');
            out.push('"');
        } else {
            out.push(ch);
        }
    }
    out.push('"');
}
