/// Normalize chunk text before embedding: unify line breaks, collapse
/// whitespace runs, and strip characters outside the allowed set.
pub fn clean_text(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut out = String::with_capacity(unified.len());
    let mut pending_space = false;
    let mut newline_run = 0usize;
    for ch in unified.chars() {
        if ch == '\n' {
            newline_run += 1;
            pending_space = false;
            // keep at most one blank line
            if newline_run <= 2 {
                out.push('\n');
            }
            continue;
        }
        newline_run = 0;
        if ch == ' ' || ch == '\t' {
            pending_space = true;
            continue;
        }
        if !is_allowed(ch) {
            continue;
        }
        if pending_space && !out.is_empty() && !out.ends_with('\n') {
            out.push(' ');
        }
        pending_space = false;
        out.push(ch);
    }
    out.trim().to_string()
}

fn is_allowed(ch: char) -> bool {
    ch.is_alphanumeric()
        || matches!(
            ch,
            '.' | ','
                | ';'
                | ':'
                | '!'
                | '?'
                | '\''
                | '"'
                | '('
                | ')'
                | '['
                | ']'
                | '-'
                | '/'
                | '%'
                | '+'
                | '&'
                | '='
                | '<'
                | '>'
                | '#'
                | '*'
        )
}

/// Share of alphanumeric characters in `text`; degenerate table/boilerplate
/// fragments score low and get rejected by validation.
pub fn informative_ratio(text: &str) -> f32 {
    let total = text.chars().count();
    if total == 0 {
        return 0.0;
    }
    let informative = text.chars().filter(|c| c.is_alphanumeric()).count();
    informative as f32 / total as f32
}
