//! The recursive descent parser.
//!
//! The grammar, with `{}` for repetition and `[]` for optional parts:
//!
//! ```text
//! ROOT        := STRUCTURE { LINE_BREAK STRUCTURE }
//! STRUCTURE   := CONFIG | ENVIRONMENT | ASSIGNMENT
//! CONFIG      := '%' ( DEFINE | ASSIGN | PARSE )
//! ENVIRONMENT := BEGIN_ALIGN ASSIGNMENT { LINE_BREAK ASSIGNMENT } END_ALIGN
//! ASSIGNMENT  := ( TENSOR | COVDRV ) '=' EXPRESSION
//! EXPRESSION  := TERM { ( '+' | '-' ) TERM }
//! TERM        := FACTOR { [ '/' ] FACTOR }
//! FACTOR      := ( BASE | 'e' ) { '^' EXPONENT }
//! BASE        := [ '-' ] ( ATOM | '(' EXPRESSION ')' )
//! EXPONENT    := BASE | '{' EXPRESSION '}' | '{{' EXPRESSION '}}'
//! ATOM        := NUMBER | TENSOR | COMMAND | OPERATOR
//! ```
//!
//! Directives are in [directive] and derivative operators in [derivative].
//! Constructs that are defined in terms of simpler ones (Christoffel symbols
//! and covariant derivatives) are expanded by generating their definition as
//! text and parsing it with a nested parser that shares the session.

mod derivative;
mod directive;

use crate::error::{Error, ErrorKind};
use crate::generate;
use crate::lexer::Lexer;
use crate::prepass;
use crate::session::{Session, Value};
use crate::spellcheck;
use crate::summation::Summation;
use crate::tensor::{self, Index, Tensor};
use crate::token::{self, Kind};
use derivative::Location;
use symexpr::{Expr, Func};

// Tokens that can start a factor, and so continue a product by juxtaposition.
const FACTOR_START: [Kind; 18] = [
    Kind::LeftParen,
    Kind::Partial,
    Kind::Letter,
    Kind::Rational,
    Kind::Decimal,
    Kind::Integer,
    Kind::Nabla,
    Kind::Pi,
    Kind::Euler,
    Kind::Diacritic,
    Kind::Mathop,
    Kind::Divide,
    Kind::Command,
    Kind::SqrtCmd,
    Kind::FracCmd,
    Kind::TrigCmd,
    Kind::NlogCmd,
    Kind::Vphantom,
];

pub(crate) struct Parser<'s> {
    lexer: Lexer,
    session: &'s mut Session,
    // names defined by this parse and its nested parses, in order
    defined: Vec<String>,
    depth: usize,
}

impl<'s> Parser<'s> {
    pub(crate) fn new(session: &'s mut Session, depth: usize) -> Parser<'s> {
        Parser {
            lexer: Lexer::default(),
            session,
            defined: vec![],
            depth,
        }
    }

    pub(crate) fn parse(mut self, text: &str) -> Result<Vec<String>, Error> {
        self.run(text)?;
        Ok(self.defined)
    }

    pub(crate) fn parse_expression(mut self, text: &str) -> Result<Expr, Error> {
        self.start(text)?;
        let expr = self.expression()?;
        if self.lexer.token().is_some() {
            return Err(self.unexpected(None));
        }
        Ok(expr.map(&mut |e| {
            if let Some(symbol) = tensor::constant_of(e) {
                return Some(Expr::symbol(symbol));
            }
            Tensor::from_node(e)
                .filter(|tensor| tensor.rank() == 0)
                .map(|tensor| Expr::symbol(tensor.symbol))
        }))
    }

    fn start(&mut self, text: &str) -> Result<(), Error> {
        let text = prepass::desugar(text);
        self.lexer.initialize(&text, 0);
        self.lexer.lex()?;
        Ok(())
    }

    fn run(&mut self, text: &str) -> Result<(), Error> {
        self.start(text)?;
        while self.lexer.token().is_some() {
            self.structure()?;
            if self.accept(Kind::LineBreak)? || self.peek(Kind::Comment) {
                continue;
            }
            if self.lexer.token().is_some() {
                return Err(self.unexpected(Some(Kind::LineBreak.description())));
            }
        }
        Ok(())
    }

    /// Parses generated text in a nested parser sharing this session.
    fn reparse(&mut self, text: &str) -> Result<(), Error> {
        tracing::debug!(depth = self.depth + 1, "expanding\n{text}");
        let mut nested = Parser::new(&mut *self.session, self.depth + 1);
        nested.defined = std::mem::take(&mut self.defined);
        let result = nested.run(text);
        self.defined = nested.defined;
        result
    }

    fn record(&mut self, symbol: &str) {
        if !self.defined.iter().any(|defined| defined == symbol) {
            self.defined.push(symbol.to_string());
        }
    }

    fn define(&mut self, symbol: &str, value: Value) {
        self.session.namespace.insert(symbol.to_string(), value);
        self.record(symbol);
    }

    // Token helpers.

    fn peek(&self, kind: Kind) -> bool {
        self.lexer.token() == Some(kind)
    }

    fn accept(&mut self, kind: Kind) -> Result<bool, Error> {
        if self.peek(kind) {
            self.lexer.lex()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, kind: Kind) -> Result<(), Error> {
        if self.accept(kind)? {
            Ok(())
        } else {
            Err(self.unexpected(Some(kind.description())))
        }
    }

    /// Accepts `_`, including the underscore of a `_d` token, which is then
    /// split so that `d` is the next token.
    fn accept_underscore(&mut self) -> Result<bool, Error> {
        if self.peek(Kind::DerivType) && self.lexer.lexeme() == "_d" {
            self.lexer.split(1)?;
            return Ok(true);
        }
        self.accept(Kind::Underscore)
    }

    fn expect_underscore(&mut self) -> Result<(), Error> {
        if self.accept_underscore()? {
            Ok(())
        } else {
            Err(self.unexpected(Some(Kind::Underscore.description())))
        }
    }

    fn error(&self, kind: ErrorKind) -> Error {
        self.error_at(kind, self.lexer.offset())
    }

    fn error_at(&self, kind: ErrorKind, offset: usize) -> Error {
        Error::new(kind, self.lexer.source(), offset)
    }

    fn unexpected(&self, expected: Option<&'static str>) -> Error {
        match self.lexer.token() {
            Some(_) => self.error(ErrorKind::UnexpectedToken {
                found: self.lexer.lexeme().to_string(),
                expected,
            }),
            None => self.error(ErrorKind::UnexpectedEnd { expected }),
        }
    }

    /// Reads an unsigned integer token.
    fn integer(&mut self) -> Result<usize, Error> {
        if !self.peek(Kind::Integer) {
            return Err(self.unexpected(Some(Kind::Integer.description())));
        }
        let lexeme = self.lexer.lexeme().to_string();
        let value = lexeme
            .parse::<usize>()
            .map_err(|_| self.error(ErrorKind::InvalidInteger(lexeme)))?;
        self.lexer.lex()?;
        Ok(value)
    }

    /// Reads an index letter. `e` is a letter here.
    fn index_letter(&mut self) -> Result<String, Error> {
        if self.peek(Kind::Euler) {
            self.lexer.retag(Kind::Letter);
        }
        let letter = strip(self.lexer.lexeme());
        self.expect(Kind::Letter)?;
        Ok(letter)
    }

    // Structures.

    fn structure(&mut self) -> Result<(), Error> {
        match self.lexer.token() {
            Some(Kind::Comment) => self.config(),
            Some(Kind::BeginAlign) => self.environment(),
            _ => self.assignment(),
        }
    }

    fn environment(&mut self) -> Result<(), Error> {
        self.expect(Kind::BeginAlign)?;
        self.assignment()?;
        while self.accept(Kind::LineBreak)? {
            if self.peek(Kind::EndAlign) {
                break;
            }
            self.assignment()?;
        }
        self.expect(Kind::EndAlign)
    }

    fn assignment(&mut self) -> Result<(), Error> {
        let offset = self.lexer.offset();
        let node = if self.at_covdrv()? {
            self.covdrv(Location::Lhs)?
        } else {
            self.tensor()?
        };
        let lhs = match tensor::constant_of(&node) {
            Some(symbol) => Tensor::new(symbol, vec![]),
            None => Tensor::from_node(&node)
                .ok_or_else(|| self.error_at(ErrorKind::UnexpectedKeyword, offset))?,
        };
        self.expect(Kind::Equal)?;
        let rhs = self.expression()?;
        let indexed = lhs.rank() > 0
            || rhs.any(|e| match e {
                Expr::Derivative(..) => true,
                e => Tensor::from_node(e).is_some_and(|tensor| tensor.rank() > 0),
            });
        if indexed {
            let rhs = rhs.expand();
            let value = Summation::compile(&lhs, &rhs, self.session)
                .and_then(|summation| {
                    let code = summation.to_string();
                    tracing::debug!(%code, "implied summation");
                    self.session.code.push(code);
                    summation.evaluate(self.session)
                })
                .map_err(|kind| self.error_at(kind, offset))?;
            self.define(&lhs.symbol, value);
        } else {
            let rhs = rhs.map(&mut |e| {
                if let Some(symbol) = tensor::constant_of(e) {
                    return Some(Expr::symbol(symbol));
                }
                Tensor::from_node(e).map(|tensor| Expr::symbol(tensor.symbol))
            });
            self.define(&lhs.symbol, Value::Scalar(rhs.doit()));
        }
        Ok(())
    }

    // Expressions.

    fn expression(&mut self) -> Result<Expr, Error> {
        let mut expr = self.term()?;
        loop {
            if self.accept(Kind::Plus)? {
                expr = expr + self.term()?;
            } else if self.accept(Kind::Minus)? {
                expr = expr - self.term()?;
            } else {
                return Ok(expr);
            }
        }
    }

    fn term(&mut self) -> Result<Expr, Error> {
        let mut expr = self.factor()?;
        while self
            .lexer
            .token()
            .is_some_and(|kind| FACTOR_START.contains(&kind))
        {
            if self.accept(Kind::Divide)? {
                expr = expr / self.factor()?;
            } else {
                expr = expr * self.factor()?;
            }
        }
        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr, Error> {
        // None stands for a bottom `e`
        let bottom = if self.accept(Kind::Euler)? {
            None
        } else {
            Some(self.base()?)
        };
        let mut stack = vec![bottom];
        while self.accept(Kind::Caret)? {
            stack.push(Some(self.exponent()?));
        }
        let mut expr = stack.pop().flatten().unwrap_or_else(Expr::e);
        while let Some(base) = stack.pop() {
            expr = match base {
                None => Expr::exp(expr),
                Some(base) => Expr::pow(base, expr),
            };
        }
        Ok(expr)
    }

    fn base(&mut self) -> Result<Expr, Error> {
        let negative = self.accept(Kind::Minus)?;
        let expr = if self.accept(Kind::LeftParen)? {
            let expr = self.expression()?;
            self.expect(Kind::RightParen)?;
            expr
        } else {
            self.atom()?
        };
        Ok(if negative { -expr } else { expr })
    }

    fn exponent(&mut self) -> Result<Expr, Error> {
        if self.accept(Kind::LeftBrace)? {
            let double = self.accept(Kind::LeftBrace)?;
            let expr = self.expression()?;
            if double {
                self.expect(Kind::RightBrace)?;
            }
            self.expect(Kind::RightBrace)?;
            return Ok(expr);
        }
        self.base()
    }

    fn atom(&mut self) -> Result<Expr, Error> {
        if self.at_covdrv()? {
            return self.operator();
        }
        match self.lexer.token() {
            Some(Kind::Rational | Kind::Decimal | Kind::Integer | Kind::Pi) => self.number(),
            Some(Kind::Letter | Kind::Diacritic | Kind::Mathop) => self.reference(),
            Some(Kind::Euler) => {
                self.lexer.lex()?;
                Ok(Expr::e())
            }
            Some(
                Kind::Command | Kind::SqrtCmd | Kind::FracCmd | Kind::NlogCmd | Kind::TrigCmd,
            ) => self.command(),
            Some(Kind::Vphantom | Kind::Partial | Kind::Nabla) => self.operator(),
            _ => Err(self.unexpected(None)),
        }
    }

    /// A tensor reference. A Christoffel symbol is first defined from its
    /// metric.
    fn reference(&mut self) -> Result<Expr, Error> {
        let offset = self.lexer.offset();
        let node = self.tensor()?;
        if let Some(tensor) = Tensor::from_node(&node) {
            if generate::is_christoffel(&tensor.symbol) {
                self.christoffel(&tensor.symbol, offset)?;
            }
        }
        Ok(node)
    }

    fn christoffel(&mut self, symbol: &str, offset: usize) -> Result<(), Error> {
        let Some(dimension) = self.session.dimension else {
            return Err(self.error_at(ErrorKind::DimensionInference(symbol.to_string()), offset));
        };
        self.reparse(&generate::christoffel(symbol, dimension))
    }

    fn number(&mut self) -> Result<Expr, Error> {
        let lexeme = self.lexer.lexeme().to_string();
        let kind = self.lexer.token();
        self.lexer.lex()?;
        Ok(match kind {
            Some(Kind::Rational) => {
                let mut parts = lexeme
                    .split(|c: char| !c.is_ascii_digit())
                    .filter(|part| !part.is_empty());
                let numerator = parts.next().unwrap_or("0");
                let denominator = parts.next().unwrap_or("1");
                match (numerator.parse::<i64>(), denominator.parse::<i64>()) {
                    (Ok(n), Ok(d)) => Expr::rational(n, d),
                    _ => Expr::float(to_f64(numerator) / to_f64(denominator)),
                }
            }
            Some(Kind::Decimal) => Expr::float(to_f64(&lexeme)),
            Some(Kind::Integer) => match lexeme.parse::<i64>() {
                Ok(n) => Expr::integer(n),
                Err(_) => Expr::float(to_f64(&lexeme)),
            },
            _ => Expr::pi(),
        })
    }

    // Commands.

    fn command(&mut self) -> Result<Expr, Error> {
        match self.lexer.token() {
            Some(Kind::SqrtCmd) => self.sqrt(),
            Some(Kind::FracCmd) => self.frac(),
            Some(Kind::NlogCmd) => self.nlog(),
            Some(Kind::TrigCmd) => self.trig(),
            _ => {
                let command = self.lexer.lexeme().to_string();
                let suggestion = spellcheck::closest(&token::COMMANDS, &strip(&command));
                Err(self.error(ErrorKind::UnsupportedCommand {
                    command,
                    suggestion,
                }))
            }
        }
    }

    fn sqrt(&mut self) -> Result<Expr, Error> {
        self.expect(Kind::SqrtCmd)?;
        let mut root: i64 = 2;
        if self.accept(Kind::LeftBracket)? {
            let offset = self.lexer.offset();
            let integer = self.integer()?;
            root = match i64::try_from(integer) {
                Ok(root) if root > 0 => root,
                _ => {
                    return Err(
                        self.error_at(ErrorKind::InvalidInteger(integer.to_string()), offset)
                    )
                }
            };
            self.expect(Kind::RightBracket)?;
        }
        self.expect(Kind::LeftBrace)?;
        let expr = self.expression()?;
        self.expect(Kind::RightBrace)?;
        Ok(Expr::pow(expr, Expr::rational(1, root)))
    }

    fn frac(&mut self) -> Result<Expr, Error> {
        self.expect(Kind::FracCmd)?;
        self.expect(Kind::LeftBrace)?;
        let numerator = self.expression()?;
        self.expect(Kind::RightBrace)?;
        self.expect(Kind::LeftBrace)?;
        let denominator = self.expression()?;
        self.expect(Kind::RightBrace)?;
        Ok(numerator / denominator)
    }

    fn nlog(&mut self) -> Result<Expr, Error> {
        let natural = self.lexer.lexeme() == r"\ln";
        self.expect(Kind::NlogCmd)?;
        let mut base = 10;
        if !natural && self.accept_underscore()? {
            base = self.small_integer()?;
        }
        let arg = self.function_argument()?;
        if natural {
            return Ok(Expr::log(arg));
        }
        Ok(Expr::log(arg) / Expr::log(Expr::integer(base as i64)))
    }

    fn trig(&mut self) -> Result<Expr, Error> {
        let offset = self.lexer.offset();
        let name = strip(self.lexer.lexeme());
        self.expect(Kind::TrigCmd)?;
        let func = Func::trigonometric(&name).ok_or_else(|| {
            self.error_at(
                ErrorKind::UnsupportedCommand {
                    command: format!("\\{name}"),
                    suggestion: None,
                },
                offset,
            )
        })?;
        let mut exponent: i64 = 1;
        if self.accept(Kind::Caret)? {
            let braced = self.accept(Kind::LeftBrace)?;
            let negative = self.accept(Kind::Minus)?;
            exponent = self.integer()? as i64;
            if negative {
                exponent = -exponent;
            }
            if braced {
                self.expect(Kind::RightBrace)?;
            }
        }
        let arg = self.function_argument()?;
        Ok(match (exponent, func.inverse()) {
            (-1, Some(inverse)) => Expr::func(inverse, arg),
            (1, _) => Expr::func(func, arg),
            (n, _) => Expr::pow(Expr::func(func, arg), Expr::integer(n)),
        })
    }

    // `n` or `{n}`
    fn small_integer(&mut self) -> Result<usize, Error> {
        if self.accept(Kind::LeftBrace)? {
            let n = self.integer()?;
            self.expect(Kind::RightBrace)?;
            return Ok(n);
        }
        self.integer()
    }

    fn function_argument(&mut self) -> Result<Expr, Error> {
        match self.lexer.token() {
            Some(Kind::Letter | Kind::Diacritic | Kind::Mathop) => self.tensor(),
            Some(Kind::Integer) => self.number(),
            Some(Kind::LeftParen) => {
                self.lexer.lex()?;
                let expr = self.expression()?;
                self.expect(Kind::RightParen)?;
                Ok(expr)
            }
            _ => Err(self.unexpected(Some("an argument"))),
        }
    }

    // Tensors.

    /// Parses a tensor reference and returns its node.
    ///
    /// The symbol gets one `D` per lower index and one `U` per upper index.
    /// A comma in the lower indices makes a stored derivative reference.
    fn tensor(&mut self) -> Result<Expr, Error> {
        let mut symbol = self.symbol()?;
        let mut indices = vec![];
        if self.accept_underscore()? {
            let (lower, derivatives) = self.lower_indices()?;
            symbol.push_str(&"D".repeat(lower.len()));
            indices.extend(lower);
            if !derivatives.is_empty() {
                return self.stored_derivative(&Tensor::new(symbol, indices), &derivatives);
            }
        }
        if self.peek(Kind::Caret) && !self.at_power()? {
            self.expect(Kind::Caret)?;
            let upper = self.upper_indices()?;
            symbol.push_str(&"U".repeat(upper.len()));
            indices.extend(upper);
            if self.accept_underscore()? {
                let (lower, derivatives) = self.lower_indices()?;
                symbol.push_str(&"D".repeat(lower.len()));
                indices.extend(lower);
                if !derivatives.is_empty() {
                    return self.stored_derivative(&Tensor::new(symbol, indices), &derivatives);
                }
            }
        }
        if indices.is_empty() {
            if let Some(Value::Constant(constant)) = self.session.namespace.get(&symbol) {
                return Ok(tensor::constant_node(constant));
            }
        }
        Ok(Tensor::new(symbol, indices).to_node())
    }

    // Whether the current `^` starts a `^{{...}}` power rather than indices.
    fn at_power(&mut self) -> Result<bool, Error> {
        let mark = self.lexer.mark();
        self.lexer.lex()?;
        let power = self.accept(Kind::LeftBrace)? && self.peek(Kind::LeftBrace);
        self.lexer.reset(mark)?;
        Ok(power)
    }

    /// A single symbol: a letter, a decorated letter, or `\mathop{name}`.
    fn symbol(&mut self) -> Result<String, Error> {
        if self.peek(Kind::Euler) {
            self.lexer.retag(Kind::Letter);
        }
        match self.lexer.token() {
            Some(Kind::Letter) => {
                let letter = strip(self.lexer.lexeme());
                self.lexer.lex()?;
                Ok(letter)
            }
            Some(Kind::Diacritic) => {
                let diacritic = strip(self.lexer.lexeme());
                self.lexer.lex()?;
                self.expect(Kind::LeftBrace)?;
                let letter = self.index_letter()?;
                self.expect(Kind::RightBrace)?;
                Ok(letter + &diacritic)
            }
            Some(Kind::Mathop) => {
                self.lexer.lex()?;
                self.expect(Kind::LeftBrace)?;
                if !self.peek(Kind::Letter) && !self.peek(Kind::Euler) {
                    return Err(self.unexpected(Some(Kind::Letter.description())));
                }
                let mut name = String::new();
                while matches!(
                    self.lexer.token(),
                    Some(Kind::Letter | Kind::Euler | Kind::Integer | Kind::Underscore)
                ) {
                    name.push_str(self.lexer.lexeme());
                    self.lexer.lex()?;
                }
                self.expect(Kind::RightBrace)?;
                Ok(name.replace('\\', ""))
            }
            _ => Err(self.unexpected(Some(Kind::Letter.description()))),
        }
    }

    // One index: a letter, or an integer read as one index per digit.
    fn index(&mut self) -> Result<Option<Vec<Index>>, Error> {
        if self.peek(Kind::Euler) {
            self.lexer.retag(Kind::Letter);
        }
        match self.lexer.token() {
            Some(Kind::Letter) => Ok(Some(vec![Index::letter(self.index_letter()?)])),
            Some(Kind::Integer) => {
                let digits = self
                    .lexer
                    .lexeme()
                    .chars()
                    .filter_map(|c| c.to_digit(10))
                    .map(|digit| Index::Fixed(digit as usize))
                    .collect();
                self.lexer.lex()?;
                Ok(Some(digits))
            }
            _ => Ok(None),
        }
    }

    fn upper_indices(&mut self) -> Result<Vec<Index>, Error> {
        if self.accept(Kind::LeftBrace)? {
            let mut indices = vec![];
            while let Some(index) = self.index()? {
                indices.extend(index);
            }
            self.expect(Kind::RightBrace)?;
            return Ok(indices);
        }
        match self.index()? {
            Some(index) => Ok(index),
            None => Err(self.unexpected(Some("an index"))),
        }
    }

    // Lower indices and the derivative indices after a comma.
    fn lower_indices(&mut self) -> Result<(Vec<Index>, Vec<String>), Error> {
        if !self.accept(Kind::LeftBrace)? {
            return match self.index()? {
                Some(index) => Ok((index, vec![])),
                None => Err(self.unexpected(Some("an index"))),
            };
        }
        let mut indices = vec![];
        while let Some(index) = self.index()? {
            indices.extend(index);
        }
        let mut derivatives = vec![];
        if self.accept(Kind::Comma)? {
            while self.peek(Kind::Letter) || self.peek(Kind::Euler) {
                derivatives.push(self.index_letter()?);
            }
        }
        self.expect(Kind::RightBrace)?;
        Ok((indices, derivatives))
    }
}

fn strip(lexeme: &str) -> String {
    lexeme.trim_start_matches('\\').to_string()
}

fn to_f64(digits: &str) -> f64 {
    digits.parse().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expression(text: &str) -> Expr {
        let mut session = Session::new();
        Parser::new(&mut session, 0).parse_expression(text).unwrap()
    }

    macro_rules! expression_tests {
        ( $( ($name: ident, $input: expr, $want: expr), )+ ) => {
            $(
                #[test]
                fn $name() {
                    assert_eq!(expression($input).to_string(), $want);
                }
            )+
        };
    }

    expression_tests!(
        (integer, "3", "3"),
        (rational, "3/4", "3/4"),
        (frac_rational, r"\frac{1}{2}", "1/2"),
        (implicit_product, "2 x y", "2*x*y"),
        (division, "x / y", "x/y"),
        (subtraction, "x - y", "x - y"),
        (negation, "-x", "-x"),
        (power, "x^{{2}}", "x^2"),
        (power_of_parenthesis, "(x + 1)^2", "(1 + x)^2"),
        (power_tower_is_right_associative, "(x)^{(y)^{z}}", "x^(y^z)"),
        (exponential, "e^x", "exp(x)"),
        (euler_alone, "e", "E"),
        (square_root, r"\sqrt{x}", "sqrt(x)"),
        (cube_root, r"\sqrt[3]{x}", "x^(1/3)"),
        (fraction, r"\frac{x}{y}", "x/y"),
        (natural_log, r"\ln x", "log(x)"),
        (sine, r"\sin(x)", "sin(x)"),
        (inverse_sine, r"\sin^{-1} x", "asin(x)"),
        (squared_cosine, r"\cos^2 x", "cos(x)^2"),
        (pi, r"2\pi", "2*pi"),
        (greek_letter, r"\alpha", "alpha"),
        (decorated_letter, r"\bar{g}", "gbar"),
        (mathop_name, r"\mathop{speed}", "speed"),
        (sizing_is_ignored, r"\left(x\right)", "x"),
    );

    #[test]
    fn log_with_base() {
        let want = Expr::log(Expr::symbol("x")) / Expr::log(Expr::integer(2));
        assert_eq!(expression(r"\log_2 x"), want);
        let want = Expr::log(Expr::symbol("x")) / Expr::log(Expr::integer(10));
        assert_eq!(expression(r"\log x"), want);
    }

    #[test]
    fn indexed_reference() {
        let want = Tensor::new(
            "gUD",
            vec![Index::letter("i"), Index::letter("j")],
        )
        .to_node();
        assert_eq!(expression("g^i_j"), want);
    }

    #[test]
    fn digits_are_separate_indices() {
        let want = Tensor::new("gDD", vec![Index::Fixed(1), Index::Fixed(2)]).to_node();
        assert_eq!(expression("g_{12}"), want);
    }

    #[test]
    fn unsupported_command_suggests_spelling() {
        let mut session = Session::new();
        let err = Parser::new(&mut session, 0)
            .parse_expression(r"\sqr{x}")
            .unwrap_err();
        assert_eq!(
            err.kind(),
            &ErrorKind::UnsupportedCommand {
                command: r"\sqr".into(),
                suggestion: Some("sqrt"),
            }
        );
    }

    #[test]
    fn trailing_tokens_are_rejected() {
        let mut session = Session::new();
        let err = Parser::new(&mut session, 0)
            .parse_expression("x )")
            .unwrap_err();
        assert_eq!(
            err.kind(),
            &ErrorKind::UnexpectedToken {
                found: ")".into(),
                expected: None,
            }
        );
        assert_eq!(err.offset(), 2);
    }

    #[test]
    fn root_must_fit() {
        for root in ["0", "18446744073709551615"] {
            let mut session = Session::new();
            let err = Parser::new(&mut session, 0)
                .parse_expression(&format!(r"\sqrt[{root}]{{x}}"))
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidInteger(root.into()));
            assert_eq!(err.offset(), 6);
        }
    }
}
