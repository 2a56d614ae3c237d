//! The token table.
//!
//! Each token kind is matched by one regular expression.
//! The expressions are tried in the order of [TABLE] and the first one that
//! matches at the current position wins, so every keyword and command pattern
//! has to come before the generic letter and command patterns that would
//! otherwise swallow it.

use once_cell::sync::Lazy;
use regex::Regex;

/// Kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Space,
    Rational,
    Decimal,
    Integer,
    Nabla,
    Pi,
    Euler,
    Plus,
    Minus,
    Divide,
    Equal,
    Caret,
    Comma,
    Colon,
    Comment,
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Bigl,
    Bigr,
    LeftDelim,
    RightDelim,
    LineBreak,
    BeginAlign,
    EndAlign,
    Partial,
    SqrtCmd,
    FracCmd,
    TrigCmd,
    NlogCmd,
    Vphantom,
    DefineMacro,
    AssignMacro,
    ParseMacro,
    IndexKwrd,
    BasisKwrd,
    DerivKwrd,
    DerivType,
    Underscore,
    Diacritic,
    Symmetry,
    Mathop,
    Letter,
    Command,
}

impl Kind {
    /// Whether the lexer drops tokens of this kind.
    ///
    /// Sizing commands like `\left` and `\bigl` only affect typesetting.
    pub fn is_skipped(self) -> bool {
        matches!(
            self,
            Kind::Space | Kind::Bigl | Kind::Bigr | Kind::LeftDelim | Kind::RightDelim
        )
    }

    /// Human readable description used in error messages.
    pub fn description(self) -> &'static str {
        use Kind::*;
        match self {
            Space => "whitespace",
            Rational => "a rational number",
            Decimal => "a decimal number",
            Integer => "an integer",
            Nabla => "`\\nabla`",
            Pi => "`\\pi`",
            Euler => "`e`",
            Plus => "`+`",
            Minus => "`-`",
            Divide => "`/`",
            Equal => "`=`",
            Caret => "`^`",
            Comma => "`,`",
            Colon => "`:`",
            Comment => "`%`",
            LeftParen => "`(`",
            RightParen => "`)`",
            LeftBrace => "`{`",
            RightBrace => "`}`",
            LeftBracket => "`[`",
            RightBracket => "`]`",
            Bigl => "`\\bigl`",
            Bigr => "`\\bigr`",
            LeftDelim => "`\\left`",
            RightDelim => "`\\right`",
            LineBreak => "a line break",
            BeginAlign => "`\\begin{align}`",
            EndAlign => "`\\end{align}`",
            Partial => "`\\partial`",
            SqrtCmd => "`\\sqrt`",
            FracCmd => "`\\frac`",
            TrigCmd => "a trigonometric function",
            NlogCmd => "a logarithm",
            Vphantom => "`\\vphantom`",
            DefineMacro => "`define`",
            AssignMacro => "`assign`",
            ParseMacro => "`parse`",
            IndexKwrd => "`index`",
            BasisKwrd => "`basis`",
            DerivKwrd => "`deriv`",
            DerivType => "a derivative type",
            Underscore => "`_`",
            Diacritic => "a diacritic",
            Symmetry => "a symmetry",
            Mathop => "`\\mathop`",
            Letter => "a letter",
            Command => "a command",
        }
    }
}

/// Greek letters accepted as single letter symbols and indices.
///
/// Each name is also accepted with its first letter capitalised.
/// Lowercase `\pi` is the constant and never reaches the letter pattern.
pub const GREEK: [&str; 24] = [
    "alpha", "beta", "gamma", "delta", "epsilon", "zeta", "eta", "theta", "iota", "kappa",
    "lambda", "mu", "nu", "xi", "omikron", "pi", "rho", "sigma", "tau", "upsilon", "phi", "chi",
    "psi", "omega",
];

/// Whether `name` is a Greek letter name, in either case.
pub fn is_greek(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => {
            let lowered: String = first.to_lowercase().chain(chars).collect();
            GREEK.contains(&lowered.as_str())
        }
        None => false,
    }
}

/// Commands the grammar understands, for spelling suggestions.
pub const COMMANDS: [&str; 20] = [
    "nabla", "pi", "partial", "sqrt", "frac", "sin", "cos", "tan", "sinh", "cosh", "tanh", "ln",
    "log", "vphantom", "hat", "tilde", "bar", "mathop", "left", "right",
];

fn greek_pattern() -> String {
    GREEK
        .iter()
        .map(|name| {
            let mut chars = name.chars();
            let first = chars.next().unwrap_or_default();
            format!(
                r"\\[{}{}]{}",
                first,
                first.to_ascii_uppercase(),
                chars.as_str()
            )
        })
        .collect::<Vec<_>>()
        .join("|")
}

/// The token patterns in priority order.
pub static TABLE: Lazy<Vec<(Kind, Regex)>> = Lazy::new(|| {
    let symmetry = r"const|metric|permutation|kronecker|nosym|(?:sym|anti)[0-9]+(?:_(?:sym|anti)[0-9]+)*";
    let letter = format!(r"[a-zA-Z]|{}", greek_pattern());
    let patterns: Vec<(Kind, &str)> = vec![
        (Kind::Space, r"(?:\s|\\,|\{\})+|&"),
        (
            Kind::Rational,
            r"[0-9]+/[1-9][0-9]*|\\frac\{[0-9]+\}\{[1-9][0-9]*\}",
        ),
        (Kind::Decimal, r"[0-9]+\.[0-9]+"),
        (Kind::Integer, r"[0-9]+"),
        (Kind::Nabla, r"\\nabla"),
        (Kind::Pi, r"\\pi"),
        (Kind::Euler, r"e"),
        (Kind::Plus, r"\+"),
        (Kind::Minus, r"-"),
        (Kind::Divide, r"/"),
        (Kind::Equal, r"="),
        (Kind::Caret, r"\^"),
        (Kind::Comma, r","),
        (Kind::Colon, r":"),
        (Kind::Comment, r"%"),
        (Kind::LeftParen, r"\("),
        (Kind::RightParen, r"\)"),
        (Kind::LeftBrace, r"\{"),
        (Kind::RightBrace, r"\}"),
        (Kind::LeftBracket, r"\["),
        (Kind::RightBracket, r"\]"),
        (Kind::Bigl, r"\\[bB]igl"),
        (Kind::Bigr, r"\\[bB]igr"),
        (Kind::LeftDelim, r"\\left"),
        (Kind::RightDelim, r"\\right"),
        (Kind::LineBreak, r";|\\\\|\\cr"),
        (Kind::BeginAlign, r"\\begin\{align\*?\}"),
        (Kind::EndAlign, r"\\end\{align\*?\}"),
        (Kind::Partial, r"\\partial"),
        (Kind::SqrtCmd, r"\\sqrt"),
        (Kind::FracCmd, r"\\frac"),
        (Kind::TrigCmd, r"\\sinh|\\cosh|\\tanh|\\sin|\\cos|\\tan"),
        (Kind::NlogCmd, r"\\ln|\\log"),
        (Kind::Vphantom, r"\\vphantom"),
        (Kind::DefineMacro, r"define"),
        (Kind::AssignMacro, r"assign"),
        (Kind::ParseMacro, r"parse"),
        (Kind::IndexKwrd, r"index"),
        (Kind::BasisKwrd, r"basis"),
        (Kind::DerivKwrd, r"deriv"),
        (Kind::DerivType, r"symbolic|_d"),
        (Kind::Underscore, r"_"),
        (Kind::Diacritic, r"\\hat|\\tilde|\\bar"),
        (Kind::Symmetry, symmetry),
        (Kind::Mathop, r"\\mathop"),
        (Kind::Letter, &letter),
        (Kind::Command, r"\\[a-z]+"),
    ];
    patterns
        .into_iter()
        .map(|(kind, pattern)| {
            let regex = Regex::new(&format!("^(?:{pattern})")).unwrap();
            (kind, regex)
        })
        .collect()
});

/// Matches the token at the start of `input`.
///
/// Returns the kind and byte length of the first matching pattern.
pub fn match_token(input: &str) -> Option<(Kind, usize)> {
    TABLE.iter().find_map(|(kind, regex)| {
        regex
            .find(input)
            .filter(|m| !m.is_empty())
            .map(|m| (*kind, m.end()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! token_tests {
        ( $( ($name: ident, $input: expr, $kind: expr, $len: expr), )+ ) => {
            $(
                #[test]
                fn $name() {
                    assert_eq!(match_token($input), Some(($kind, $len)));
                }
            )+
        };
    }

    token_tests![
        (space, "  \\, x", Kind::Space, 5),
        (rational, "1/10", Kind::Rational, 4),
        (frac_rational, "\\frac{1}{2}", Kind::Rational, 11),
        (frac_command, "\\frac{a}{2}", Kind::FracCmd, 5),
        (decimal, "2.50", Kind::Decimal, 4),
        (integer_is_unsigned, "-3", Kind::Minus, 1),
        (euler_before_letter, "ex", Kind::Euler, 1),
        (sinh_before_sin, "\\sinh x", Kind::TrigCmd, 5),
        (keyword, "define", Kind::DefineMacro, 6),
        (derivative_type, "_d", Kind::DerivType, 2),
        (underscore, "_i", Kind::Underscore, 1),
        (composite_symmetry, "anti01_sym23 g", Kind::Symmetry, 12),
        (greek_lower, "\\alpha", Kind::Letter, 6),
        (greek_upper, "\\Gamma^a", Kind::Letter, 6),
        (pi_is_constant, "\\pi", Kind::Pi, 3),
        (upper_pi_is_letter, "\\Pi", Kind::Letter, 3),
        (line_break, "\\\\", Kind::LineBreak, 2),
        (align, "\\begin{align*}", Kind::BeginAlign, 14),
        (unknown_command, "\\mathrm{x}", Kind::Command, 7),
    ];

    #[test]
    fn no_match() {
        assert_eq!(match_token("$"), None);
    }

    #[test]
    fn greek_names() {
        assert!(is_greek("Gamma"));
        assert!(is_greek("alpha"));
        assert!(!is_greek("g"));
        assert!(!is_greek("mathrm"));
    }

    #[test]
    fn skipped_kinds() {
        assert!(Kind::Space.is_skipped());
        assert!(Kind::LeftDelim.is_skipped());
        assert!(!Kind::Letter.is_skipped());
    }
}
