//! Derivative operators: `\partial`, `\nabla` and `\vphantom`.

use super::{strip, Parser};
use crate::error::{Error, ErrorKind};
use crate::generate;
use crate::instantiate::{instantiate, Storage};
use crate::session::DerivType;
use crate::tensor::{self, Index, Tensor, Variance};
use crate::token::Kind;
use indexedexp::Symmetry;
use symexpr::Expr;

// Wraps a tensor together with the marker variables of a stored derivative.
const MARKED: &str = "_Tensor";

/// Where a covariant derivative appears in an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Location {
    /// Names the result; nothing is expanded.
    Lhs,
    Rhs,
}

/// Name of the stored derivative of `symbol` of the given order.
pub(crate) fn derivative_symbol(symbol: &str, order: usize) -> String {
    let mut name = symbol.to_string();
    if !name.contains("_d") {
        name.push_str("_d");
    }
    name.push_str(&"D".repeat(order));
    name
}

fn marked_tensor(expr: &Expr) -> Option<Tensor> {
    match expr {
        Expr::Apply(name, args) if name == MARKED => Tensor::from_node(args.first()?),
        _ => None,
    }
}

impl Parser<'_> {
    /// Whether a covariant derivative starts here: `\nabla` or a decorated
    /// `\bar{\nabla}`.
    pub(super) fn at_covdrv(&mut self) -> Result<bool, Error> {
        if self.peek(Kind::Nabla) {
            return Ok(true);
        }
        if !self.peek(Kind::Diacritic) {
            return Ok(false);
        }
        let mark = self.lexer.mark();
        self.lexer.lex()?;
        let nabla = self.accept(Kind::LeftBrace)? && self.peek(Kind::Nabla);
        self.lexer.reset(mark)?;
        Ok(nabla)
    }

    pub(super) fn operator(&mut self) -> Result<Expr, Error> {
        match self.lexer.token() {
            Some(Kind::Vphantom) => self.vphantom(),
            Some(Kind::Partial) => self.pardrv(),
            Some(Kind::Nabla | Kind::Diacritic) => self.covdrv(Location::Rhs),
            _ => Err(self.error(ErrorKind::UnsupportedOperator(
                self.lexer.lexeme().to_string(),
            ))),
        }
    }

    // `\vphantom{_d}` switches the derivative convention for one operator.
    fn vphantom(&mut self) -> Result<Expr, Error> {
        self.expect(Kind::Vphantom)?;
        self.expect(Kind::LeftBrace)?;
        let deriv = DerivType::from_lexeme(self.lexer.lexeme());
        self.expect(Kind::DerivType)?;
        self.expect(Kind::RightBrace)?;
        let saved = self.session.deriv;
        if let Some(deriv) = deriv {
            self.session.deriv = deriv;
        }
        let result = self.operator();
        self.session.deriv = saved;
        result
    }

    // `i` or `{i}`
    fn operator_index(&mut self) -> Result<String, Error> {
        if self.accept(Kind::LeftBrace)? {
            let index = self.index_letter()?;
            self.expect(Kind::RightBrace)?;
            return Ok(index);
        }
        self.index_letter()
    }

    fn pardrv(&mut self) -> Result<Expr, Error> {
        let mut indices: Vec<String> = vec![];
        while self.accept(Kind::Partial)? {
            let mut order = 1;
            if self.accept(Kind::Caret)? {
                order = self.small_integer()?;
            }
            self.expect_underscore()?;
            let index = self.operator_index()?;
            indices.extend(std::iter::repeat(index).take(order));
        }
        let symbolic = indices
            .iter()
            .all(|index| self.session.basis.contains(index));
        let operand = if self.accept(Kind::LeftParen)? {
            let expr = self.expression()?;
            self.expect(Kind::RightParen)?;
            expr
        } else if self.at_covdrv()? {
            self.covdrv(Location::Rhs)?
        } else {
            self.reference()?
        };
        if symbolic || self.session.deriv == DerivType::Symbolic {
            Ok(Expr::derivative(operand, indices))
        } else {
            self.expand_stored(&operand, &indices)
        }
    }

    /// Rewrites derivatives of `expr` as references to stored derivative
    /// tensors.
    ///
    /// Every tensor is wrapped together with one marker variable per
    /// derivative index and the expression is differentiated by each marker,
    /// which applies the product and chain rules. Each resulting derivative of
    /// a wrapped tensor then names a stored derivative whose derivative
    /// indices are those selected by its markers.
    pub(super) fn expand_stored(
        &mut self,
        expr: &Expr,
        derivatives: &[String],
    ) -> Result<Expr, Error> {
        let markers: Vec<String> = (0..derivatives.len()).map(|n| format!("_x{n}")).collect();
        let mut derived = expr.map(&mut |e| {
            Tensor::from_node(e).map(|_| {
                let mut args = vec![e.clone()];
                args.extend(markers.iter().map(|marker| Expr::symbol(marker.as_str())));
                Expr::apply(MARKED, args)
            })
        });
        for marker in &markers {
            derived = derived.diff(marker);
        }
        derived.try_map(&mut |e| match e {
            Expr::Derivative(inner, variables) => {
                let Some(tensor) = marked_tensor(inner) else {
                    return Ok(None);
                };
                let selected: Vec<String> = variables
                    .iter()
                    .filter_map(|variable| markers.iter().position(|marker| marker == variable))
                    .map(|n| derivatives[n].clone())
                    .collect();
                self.stored_derivative(&tensor, &selected).map(Some)
            }
            e => Ok(marked_tensor(e).map(|tensor| tensor.to_node())),
        })
    }

    /// Declares and references the stored derivative of `tensor` by the
    /// given indices.
    ///
    /// A second derivative is symmetric in its two derivative slots.
    pub(super) fn stored_derivative(
        &mut self,
        tensor: &Tensor,
        derivatives: &[String],
    ) -> Result<Expr, Error> {
        let symbol = derivative_symbol(&tensor.symbol, derivatives.len());
        let rank = tensor.rank();
        let indices: Vec<Index> = tensor
            .indices()
            .cloned()
            .chain(derivatives.iter().map(|index| Index::letter(index.as_str())))
            .collect();
        let symmetry = if derivatives.len() == 2 {
            Symmetry::symmetric(rank, rank + 1)
        } else {
            Symmetry::none()
        };
        let dimension = self.session.dimension;
        let defined = instantiate(self.session, &symbol, &Storage::Symmetric(symmetry), dimension)
            .map_err(|kind| self.error(kind))?;
        for name in defined.unwrap_or_default() {
            self.record(&name);
        }
        Ok(Tensor::new(symbol, indices).to_node())
    }

    /// Parses a covariant derivative and returns a reference to the tensor
    /// it names.
    ///
    /// On the right-hand side the definition of that tensor is generated and
    /// parsed first.
    pub(super) fn covdrv(&mut self, location: Location) -> Result<Expr, Error> {
        let offset = self.lexer.offset();
        let mut operators: Vec<(String, Variance)> = vec![];
        let mut diacritic = String::new();
        while self.at_covdrv()? {
            if self.peek(Kind::Diacritic) {
                diacritic = strip(self.lexer.lexeme());
                self.lexer.lex()?;
                self.expect(Kind::LeftBrace)?;
                self.expect(Kind::Nabla)?;
                self.expect(Kind::RightBrace)?;
            } else {
                self.expect(Kind::Nabla)?;
            }
            let variance = if self.accept(Kind::Caret)? {
                Variance::Upper
            } else {
                self.expect_underscore()?;
                Variance::Lower
            };
            operators.push((self.operator_index()?, variance));
        }
        let node = self.tensor()?;
        let tensor = match tensor::constant_of(&node) {
            Some(symbol) => Tensor::new(symbol, vec![]),
            None => Tensor::from_node(&node).ok_or_else(|| {
                self.error_at(ErrorKind::UnsupportedOperator(r"\nabla".into()), offset)
            })?,
        };
        let mut symbol = tensor.symbol.clone();
        if !symbol.contains("_cd") {
            symbol.push_str("_cd");
            symbol.push_str(&diacritic);
        }
        symbol.extend(operators.iter().map(|(_, variance)| variance.code()));
        let indices: Vec<Index> = tensor
            .indices()
            .cloned()
            .chain(operators.iter().map(|(index, _)| Index::letter(index.as_str())))
            .collect();
        if location == Location::Rhs {
            let saved = self.session.deriv;
            let result = self.expand_covariant(&tensor, &operators, &diacritic, offset);
            self.session.deriv = saved;
            result?;
        }
        Ok(Tensor::new(symbol, indices).to_node())
    }

    fn expand_covariant(
        &mut self,
        tensor: &Tensor,
        operators: &[(String, Variance)],
        diacritic: &str,
        offset: usize,
    ) -> Result<(), Error> {
        let deriv = self.session.deriv;
        if operators.iter().any(|(_, variance)| *variance == Variance::Upper) {
            let text = generate::raised_covariant_derivative(
                tensor,
                operators,
                deriv,
                diacritic,
                self.session.dimension,
            )
            .map_err(|kind| self.error_at(kind, offset))?;
            return self.reparse(&text);
        }
        let letters: Vec<String> = operators.iter().map(|(index, _)| index.clone()).collect();
        self.reparse(&generate::covariant_derivative(
            tensor, &letters, deriv, diacritic,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Session, Value};

    #[test]
    fn derivative_symbols() {
        assert_eq!(derivative_symbol("vU", 1), "vU_dD");
        assert_eq!(derivative_symbol("f", 2), "f_dDD");
        assert_eq!(derivative_symbol("vU_dD", 1), "vU_dDD");
    }

    #[test]
    fn symbolic_partial_is_unevaluated() {
        let mut session = Session::new();
        let got = Parser::new(&mut session, 0)
            .parse_expression(r"\partial_i f")
            .unwrap();
        assert_eq!(got.to_string(), "Derivative(f, i)");
    }

    #[test]
    fn second_order_partial() {
        let mut session = Session::new();
        let got = Parser::new(&mut session, 0)
            .parse_expression(r"\partial^2_i f")
            .unwrap();
        assert_eq!(got.to_string(), "Derivative(f, i, i)");
    }

    #[test]
    fn stored_partial_declares_storage() {
        let mut session = Session::new();
        session.parse("% define nosym vU (3), deriv _d").unwrap();
        let got = Parser::new(&mut session, 0)
            .parse_expression(r"\partial_j v^i")
            .unwrap();
        let want = Tensor::new("vU_dD", vec![Index::letter("i"), Index::letter("j")]).to_node();
        assert_eq!(got, want);
        assert!(matches!(session.get("vU_dD"), Some(Value::Array(_))));
    }

    #[test]
    fn stored_product_rule() {
        let mut session = Session::new();
        session
            .parse("% define nosym uU (3), wD (3), deriv _d")
            .unwrap();
        let got = Parser::new(&mut session, 0)
            .parse_expression(r"\partial_k (u^i w_j)")
            .unwrap();
        let u = Tensor::new("uU", vec![Index::letter("i")]).to_node();
        let w = Tensor::new("wD", vec![Index::letter("j")]).to_node();
        let du = Tensor::new("uU_dD", vec![Index::letter("i"), Index::letter("k")]).to_node();
        let dw = Tensor::new("wD_dD", vec![Index::letter("j"), Index::letter("k")]).to_node();
        assert_eq!(got, du * w + u * dw);
    }

    #[test]
    fn stored_second_derivative_is_symmetric() {
        let mut session = Session::new();
        session.parse("% define nosym vU (3), deriv _d").unwrap();
        let got = Parser::new(&mut session, 0)
            .parse_expression(r"\partial_i \partial_j f")
            .unwrap();
        let want = Tensor::new("f_dDD", vec![Index::letter("i"), Index::letter("j")]).to_node();
        assert_eq!(got, want);
        let array = session.get("f_dDD").and_then(Value::as_array).unwrap();
        assert_eq!(array.get(&[0, 1]), array.get(&[1, 0]));
    }

    #[test]
    fn vphantom_overrides_convention() {
        let mut session = Session::new();
        session.parse("% define nosym vU (3)").unwrap();
        let got = Parser::new(&mut session, 0)
            .parse_expression(r"\vphantom{_d} \partial_j v^i")
            .unwrap();
        let want = Tensor::new("vU_dD", vec![Index::letter("i"), Index::letter("j")]).to_node();
        assert_eq!(got, want);
        assert_eq!(session.deriv_type(), DerivType::Symbolic);
    }

    #[test]
    fn covariant_derivative_name() {
        let mut session = Session::new();
        session
            .parse("% define basis [x, y, z]; % define metric gDD (3), nosym vU (3)")
            .unwrap();
        let got = Parser::new(&mut session, 0)
            .parse_expression(r"\nabla_j v^i")
            .unwrap();
        let want = Tensor::new("vU_cdD", vec![Index::letter("i"), Index::letter("j")]).to_node();
        assert_eq!(got, want);
        assert!(matches!(session.get("vU_cdD"), Some(Value::Array(_))));
        assert!(matches!(session.get("GammaUDD"), Some(Value::Array(_))));
    }

    #[test]
    fn raised_covariant_derivative_needs_dimension() {
        let mut session = Session::new();
        let err = Parser::new(&mut session, 0)
            .parse_expression(r"x + \nabla^j v^i")
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::DimensionInference("gUU".into()));
        assert_eq!(err.offset(), 4);
    }
}
