//! Argument splitting for function calls.
//!
//! Built-in functions receive their arguments as raw text so each handler can
//! decide how to resolve them (ranges, references, literals, or nested
//! expressions). The scanners here respect string literals and nested
//! parentheses, so `"a,b"` and `SUM(3,4)` each stay a single argument.

/// Split a function's argument list on top-level commas.
///
/// Inside a `"..."` literal a backslash escapes the next character, and
/// commas inside quotes or nested parentheses do not split. Arguments are
/// trimmed. Every comma separates two arguments, so `1,2,` yields a trailing
/// empty argument; only blank text yields none.
pub fn split_arguments(args_text: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escaped = false;
    let mut depth = 0usize;

    for ch in args_text.chars() {
        if in_quotes {
            current.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_quotes = false;
            }
            continue;
        }
        match ch {
            '"' => {
                in_quotes = true;
                current.push(ch);
            }
            '(' => {
                depth += 1;
                current.push(ch);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            ',' if depth == 0 => {
                args.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    if !args.is_empty() || !current.trim().is_empty() {
        args.push(current.trim().to_string());
    }
    args
}

/// Byte index of the `)` matching the `(` at `open`, skipping string literals.
pub fn find_matching_paren(text: &str, open: usize) -> Option<usize> {
    if text.as_bytes().get(open) != Some(&b'(') {
        return None;
    }
    let mut depth = 0usize;
    let mut in_quotes = false;
    let mut escaped = false;
    for (idx, &b) in text.as_bytes().iter().enumerate().skip(open) {
        if in_quotes {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_quotes = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_quotes = true,
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

/// Arguments of the first call to `function_name` in `formula`.
///
/// Locates the first `(` after the function name, finds its matching `)`,
/// and splits the interior. An unterminated call takes the rest of the text.
pub fn extract_arguments(formula: &str, function_name: &str) -> Option<Vec<String>> {
    let upper = formula.to_ascii_uppercase();
    let name_at = upper.find(&function_name.to_ascii_uppercase())?;
    let open = name_at + formula[name_at..].find('(')?;
    let close = find_matching_paren(formula, open).unwrap_or(formula.len());
    Some(split_arguments(&formula[open + 1..close]))
}

/// If the whole formula is a single call `NAME(...)`, return the name and
/// the raw interior of its parentheses.
pub fn single_call(formula: &str) -> Option<(&str, &str)> {
    let formula = formula.trim();
    let open = formula.find('(')?;
    let name = formula[..open].trim_end();
    if name.is_empty()
        || !name.starts_with(|c: char| c.is_ascii_alphabetic())
        || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
    {
        return None;
    }
    let close = find_matching_paren(formula, open)?;
    if close != formula.len() - 1 {
        return None;
    }
    Some((name, &formula[open + 1..close]))
}

/// The contents of a `"..."` literal with `\"` and `\\` escapes resolved.
/// Returns None if `text` is not exactly one quoted literal.
pub fn unquote(text: &str) -> Option<String> {
    let inner = text.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some(escaped) => out.push(escaped),
                None => return None,
            },
            '"' => return None,
            _ => out.push(ch),
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_split_arguments_respects_quotes_and_nesting() {
        assert_eq!(
            split_arguments(r#"1,2,"a,b",SUM(3,4)"#),
            vec!["1", "2", r#""a,b""#, "SUM(3,4)"]
        );
    }

    #[test]
    fn test_split_arguments_trims_and_keeps_empty_arguments() {
        assert_eq!(split_arguments(" A1 , B2 ,"), vec!["A1", "B2", ""]);
        assert_eq!(split_arguments("1,,2"), vec!["1", "", "2"]);
        assert_eq!(split_arguments(","), vec!["", ""]);
        assert!(split_arguments("").is_empty());
        assert!(split_arguments("  ").is_empty());
    }

    #[test]
    fn test_split_arguments_escaped_quote() {
        assert_eq!(
            split_arguments(r#""say \"hi, there\"",2"#),
            vec![r#""say \"hi, there\"""#, "2"]
        );
    }

    #[test]
    fn test_split_arguments_escaped_backslash_ends_literal() {
        assert_eq!(
            split_arguments(r#""a\\",B1,"c""#),
            vec![r#""a\\""#, "B1", r#""c""#]
        );
    }

    #[test]
    fn test_extract_arguments_nested() {
        assert_eq!(
            extract_arguments("IF(A1>0,SUM(B1:B3,MAX(1,2)),\"x)\")", "IF").unwrap(),
            vec!["A1>0", "SUM(B1:B3,MAX(1,2))", "\"x)\""]
        );
        assert_eq!(extract_arguments("sum(1,2)", "SUM").unwrap(), vec!["1", "2"]);
        assert!(extract_arguments("A1+1", "SUM").is_none());
    }

    #[test]
    fn test_find_matching_paren() {
        assert_eq!(find_matching_paren("(a(b)c)", 0), Some(6));
        assert_eq!(find_matching_paren("(\")\")", 0), Some(4));
        assert_eq!(find_matching_paren("(a", 0), None);
        assert_eq!(find_matching_paren("a(", 0), None);
        assert_eq!(find_matching_paren(r#"("a\\")+1"#, 0), Some(6));
        assert_eq!(find_matching_paren(r#"("a\")")"#, 0), Some(7));
    }

    #[test]
    fn test_single_call() {
        assert_eq!(single_call("SUM(A1:A3)"), Some(("SUM", "A1:A3")));
        assert_eq!(single_call("If(1, 2, 3)"), Some(("If", "1, 2, 3")));
        assert_eq!(single_call("SUM(1)+SUM(2)"), None);
        assert_eq!(single_call("(1+2)"), None);
        assert_eq!(single_call("1+SUM(2)"), None);
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote(r#""a,b""#).as_deref(), Some("a,b"));
        assert_eq!(unquote(r#""say \"hi\"""#).as_deref(), Some(r#"say "hi""#));
        assert_eq!(unquote(r#""a" & "b""#), None);
        assert_eq!(unquote("abc"), None);
    }
}
