//! Rule text preprocessing
//!
//! Turns a rule into a list of independently evaluable expressions in two
//! passes:
//! 1. Split on `;` outside string literals, trimming and dropping empty
//!    statements
//! 2. Rewrite statements of the form `name = expr` into `assign("name", expr)`
//!
//! All statements but the last run for their side effects only. The last one
//! is the result expression.

/// Split rule text and rewrite assignments into canonical `assign` calls
pub fn preprocess(rule: &str) -> Vec<String> {
    split_statements(rule)
        .into_iter()
        .map(|statement| match match_assignment(statement) {
            Some((name, value)) => format!("assign(\"{}\", {})", name, value),
            None => statement.to_string(),
        })
        .collect()
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum SplitState {
    Code,
    /// Inside a string literal opened by the given quote character
    Quoted(char),
}

/// Split on `;`, ignoring separators inside quoted strings
pub fn split_statements(rule: &str) -> Vec<&str> {
    let mut statements = Vec::new();
    let mut state = SplitState::Code;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in rule.char_indices() {
        match state {
            SplitState::Code => match c {
                '"' | '\'' => state = SplitState::Quoted(c),
                ';' => {
                    push_statement(&mut statements, &rule[start..i]);
                    start = i + c.len_utf8();
                }
                _ => {}
            },
            SplitState::Quoted(quote) => {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == quote {
                    state = SplitState::Code;
                }
            }
        }
    }
    push_statement(&mut statements, &rule[start..]);

    statements
}

fn push_statement<'a>(statements: &mut Vec<&'a str>, candidate: &'a str) {
    let trimmed = candidate.trim();
    if !trimmed.is_empty() {
        statements.push(trimmed);
    }
}

/// Match `identifier = remainder` at the start of a statement
///
/// The `=` must directly follow the identifier (whitespace aside) and must
/// not be the first half of `==`. Comparisons such as `a <= b`, `a != b` or
/// `x > 0 ? y : z` never match because the identifier is followed by some
/// other operator. Returns the name and the trimmed remainder.
pub fn match_assignment(statement: &str) -> Option<(&str, &str)> {
    let statement = statement.trim();
    let name_len = identifier_len(statement)?;
    let (name, rest) = statement.split_at(name_len);

    let rest = rest.trim_start().strip_prefix('=')?;
    if rest.starts_with('=') {
        return None;
    }

    let value = rest.trim();
    if value.is_empty() || is_keyword(name) {
        return None;
    }
    Some((name, value))
}

/// Byte length of the identifier at the start of `text`
fn identifier_len(text: &str) -> Option<usize> {
    let mut chars = text.char_indices();
    match chars.next() {
        Some((_, c)) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return None,
    }
    let end = chars
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_'))
        .map_or(text.len(), |(i, _)| i);
    Some(end)
}

fn is_keyword(name: &str) -> bool {
    matches!(
        name,
        "nil" | "null" | "true" | "false" | "and" | "or" | "not"
    )
}
