//! Textual rewriting that runs before lexing.
//!
//! A parenthesised expression followed by a comma or semicolon index list is
//! shorthand for a derivative of the expression:
//!
//! ```text
//! (expr)_{,i j}   ->   \partial_i \partial_j (expr)
//! (expr)_{;i}     ->   \nabla_i (expr)
//! ```
//!
//! The leading underscore is optional. Rewriting repeats until no shorthand
//! is left, so nested shorthands unfold from the inside out.

/// Rewrites every derivative shorthand in `source`.
pub fn desugar(source: &str) -> String {
    let mut text = source.to_string();
    while let Some(rewritten) = rewrite_once(&text) {
        text = rewritten;
    }
    text
}

fn rewrite_once(text: &str) -> Option<String> {
    let mut open_parens = vec![];
    for (i, c) in text.char_indices() {
        match c {
            '(' => open_parens.push(i),
            ')' => {
                let Some(open) = open_parens.pop() else {
                    continue;
                };
                let close = i + 1;
                if let Some((operator, len)) = shorthand(&text[close..]) {
                    return Some(format!(
                        "{}{} {}{}",
                        &text[..open],
                        operator,
                        &text[open..close],
                        &text[close + len..]
                    ));
                }
            }
            _ => {}
        }
    }
    None
}

// Parses a shorthand index list at the start of `rest`. Returns the operator
// text and the byte length of the list.
fn shorthand(rest: &str) -> Option<(String, usize)> {
    let body = if rest.starts_with("_{") {
        2
    } else if rest.starts_with('{') {
        1
    } else {
        return None;
    };
    let command = match rest[body..].chars().next()? {
        ',' => r"\partial",
        ';' => r"\nabla",
        _ => return None,
    };
    let close = body + rest[body..].find('}')?;
    let indices = split_indices(&rest[body + 1..close])?;
    if indices.is_empty() {
        return None;
    }
    let operator = indices
        .iter()
        .map(|index| format!("{command}_{index}"))
        .collect::<Vec<_>>()
        .join(" ");
    Some((operator, close + 1))
}

// Splits `ij` or `i \alpha` into single indices.
fn split_indices(list: &str) -> Option<Vec<&str>> {
    let mut indices = vec![];
    let mut rest = list.trim_start();
    while !rest.is_empty() {
        let len = match rest.strip_prefix('\\') {
            Some(command) => {
                let name = command
                    .chars()
                    .take_while(char::is_ascii_alphabetic)
                    .count();
                if name == 0 {
                    return None;
                }
                name + 1
            }
            None => {
                if !rest.chars().next()?.is_ascii_alphabetic() {
                    return None;
                }
                1
            }
        };
        indices.push(&rest[..len]);
        rest = rest[len..].trim_start();
    }
    Some(indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! desugar_tests {
        ( $( ($name: ident, $input: expr, $want: expr), )+ ) => {
            $(
                #[test]
                fn $name() {
                    assert_eq!(desugar($input), $want);
                }
            )+
        };
    }

    desugar_tests![
        (comma, r"T_{ij} = (v_i w_j)_{,ij}", r"T_{ij} = \partial_i \partial_j (v_i w_j)"),
        (comma_without_underscore, r"(x y){,k}", r"\partial_k (x y)"),
        (semicolon, r"(v^i)_{;j}", r"\nabla_j (v^i)"),
        (greek_index, r"(f)_{,\mu \nu}", r"\partial_\mu \partial_\nu (f)"),
        (
            nested,
            r"((a)_{,i} b)_{,j}",
            r"\partial_j (\partial_i (a) b)"
        ),
        (plain_parens_untouched, r"(a + b)^{2}", r"(a + b)^{2}"),
        (unbalanced_paren_untouched, r"a)_{,i}", r"a)_{,i}"),
        (not_an_index_list, r"(a)_{,1}", r"(a)_{,1}"),
        (lower_index_untouched, r"(a) g_{ij}", r"(a) g_{ij}"),
    ];
}
