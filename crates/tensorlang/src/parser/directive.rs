//! Configuration directives: `% define`, `% assign` and `% parse`.

use super::Parser;
use crate::error::{Error, ErrorKind};
use crate::instantiate::{instantiate, update_metric, Storage};
use crate::session::DerivType;
use crate::token::Kind;

impl Parser<'_> {
    pub(super) fn config(&mut self) -> Result<(), Error> {
        self.expect(Kind::Comment)?;
        match self.lexer.token() {
            Some(Kind::DefineMacro) => self.define_directive(),
            Some(Kind::AssignMacro) => self.assign_directive(),
            Some(Kind::ParseMacro) => {
                self.lexer.lex()?;
                self.assignment()
            }
            _ => Err(self.error(ErrorKind::UnsupportedMacro)),
        }
    }

    /// `% define` followed by comma separated entries.
    ///
    /// An entry is a global setting (`basis`, `deriv`, `index`) or a symbol
    /// declaration. A declaration without a symmetry uses the symmetry of the
    /// previous declaration.
    fn define_directive(&mut self) -> Result<(), Error> {
        self.expect(Kind::DefineMacro)?;
        let mut storage = Storage::default();
        loop {
            match self.lexer.token() {
                Some(Kind::BasisKwrd | Kind::DerivKwrd | Kind::IndexKwrd) => self.global()?,
                _ => {
                    let offset = self.lexer.offset();
                    if self.peek(Kind::Symmetry) {
                        storage = Storage::from_lexeme(self.lexer.lexeme())
                            .map_err(|kind| self.error(kind))?;
                        self.lexer.lex()?;
                    }
                    let symbol = self.symbols()?;
                    let mut dimension = None;
                    if self.accept(Kind::LeftParen)? {
                        dimension = Some(self.integer()?);
                        self.expect(Kind::RightParen)?;
                    }
                    self.declare(&symbol, &storage, dimension, offset)?;
                }
            }
            if !self.accept(Kind::Comma)? {
                return Ok(());
            }
        }
    }

    fn declare(
        &mut self,
        symbol: &str,
        storage: &Storage,
        dimension: Option<usize>,
        offset: usize,
    ) -> Result<(), Error> {
        let dimension = match (storage, dimension) {
            (Storage::Const, _) => self.session.dimension,
            (_, Some(declared)) => {
                if let Some(ambient) = self.session.dimension {
                    if ambient != declared {
                        return Err(self.error_at(
                            ErrorKind::InconsistentDimension { declared, ambient },
                            offset,
                        ));
                    }
                }
                self.session.dimension = Some(declared);
                Some(declared)
            }
            (_, None) => self.session.dimension,
        };
        let existed = self.session.namespace.contains_key(symbol);
        let defined = instantiate(self.session, symbol, storage, dimension)
            .map_err(|kind| self.error_at(kind, offset))?;
        for name in defined.unwrap_or_default() {
            self.record(&name);
        }
        if existed && self.depth == 0 {
            self.session.notify_override(symbol);
        }
        Ok(())
    }

    // One symbol name, possibly spelled as several adjacent symbols: `vU` is
    // `v` followed by `U`.
    fn symbols(&mut self) -> Result<String, Error> {
        let mut symbol = String::new();
        loop {
            if self.peek(Kind::Euler) {
                self.lexer.retag(Kind::Letter);
            }
            if !matches!(
                self.lexer.token(),
                Some(Kind::Letter | Kind::Diacritic | Kind::Mathop)
            ) {
                break;
            }
            symbol.push_str(&self.symbol()?);
        }
        if symbol.is_empty() {
            return Err(self.unexpected(Some("a symbol")));
        }
        Ok(symbol)
    }

    fn global(&mut self) -> Result<(), Error> {
        match self.lexer.token() {
            Some(Kind::BasisKwrd) => {
                self.lexer.lex()?;
                self.basis()
            }
            Some(Kind::DerivKwrd) => {
                self.lexer.lex()?;
                let deriv = DerivType::from_lexeme(self.lexer.lexeme());
                self.expect(Kind::DerivType)?;
                self.session.deriv = deriv.unwrap_or_default();
                Ok(())
            }
            Some(Kind::IndexKwrd) => {
                self.lexer.lex()?;
                self.index_range()
            }
            _ => Err(self.error(ErrorKind::UnexpectedKeyword)),
        }
    }

    // `[x, y, z]` replaces the basis.
    fn basis(&mut self) -> Result<(), Error> {
        self.expect(Kind::LeftBracket)?;
        let mut basis: Vec<String> = vec![];
        loop {
            let offset = self.lexer.offset();
            let symbol = self.index_letter()?;
            if basis.contains(&symbol) {
                return Err(self.error_at(ErrorKind::DuplicateBasisSymbol(symbol), offset));
            }
            basis.push(symbol);
            if !self.accept(Kind::Comma)? {
                break;
            }
        }
        self.expect(Kind::RightBracket)?;
        tracing::trace!(?basis, "basis");
        self.session.basis = basis;
        Ok(())
    }

    // `i = 0:3` or `[i-k] = 0:3`; the bounds are inclusive.
    fn index_range(&mut self) -> Result<(), Error> {
        let offset = self.lexer.offset();
        let letters = if self.accept(Kind::LeftBracket)? {
            let first = self.index_letter()?;
            self.expect(Kind::Minus)?;
            let last = self.index_letter()?;
            self.expect(Kind::RightBracket)?;
            letter_range(&first, &last).ok_or_else(|| {
                self.error_at(ErrorKind::InvalidIndexRange { first, last }, offset)
            })?
        } else {
            vec![self.index_letter()?]
        };
        self.expect(Kind::Equal)?;
        let start = self.integer()?;
        self.expect(Kind::Colon)?;
        let stop = self.integer()?;
        for letter in letters {
            self.session.ranges.insert(letter, (start, stop + 1));
        }
        Ok(())
    }

    fn assign_directive(&mut self) -> Result<(), Error> {
        self.expect(Kind::AssignMacro)?;
        let offset = self.lexer.offset();
        let mut storage = None;
        if self.peek(Kind::Symmetry) {
            storage = Some(
                Storage::from_lexeme(self.lexer.lexeme()).map_err(|kind| self.error(kind))?,
            );
            self.lexer.lex()?;
        }
        let symbol = self.symbols()?;
        if !self.session.namespace.contains_key(&symbol) {
            return Err(self.error_at(ErrorKind::UndefinedTensor(symbol), offset));
        }
        if storage == Some(Storage::Metric) {
            let names =
                update_metric(self.session, &symbol).map_err(|kind| self.error_at(kind, offset))?;
            for name in names {
                self.record(&name);
            }
        }
        Ok(())
    }
}

// Single letters from `first` to `last` inclusive.
fn letter_range(first: &str, last: &str) -> Option<Vec<String>> {
    let single = |s: &str| {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphabetic() => Some(c),
            _ => None,
        }
    };
    let (first, last) = (single(first)?, single(last)?);
    if first > last {
        return None;
    }
    Some((first..=last).map(String::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Session, Value};
    use crate::Notice;

    fn parse(session: &mut Session, text: &str) -> Result<Vec<String>, Error> {
        session.parse(text)
    }

    #[test]
    fn letter_ranges() {
        assert_eq!(
            letter_range("i", "k"),
            Some(vec!["i".to_string(), "j".to_string(), "k".to_string()])
        );
        assert_eq!(letter_range("k", "i"), None);
        assert_eq!(letter_range("alpha", "k"), None);
    }

    #[test]
    fn define_declares_every_entry() {
        let mut session = Session::new();
        let defined = parse(&mut session, "% define sym01 hDD (3), kDD, const c").unwrap();
        assert_eq!(defined, vec!["hDD", "kDD", "c"]);
        let k = session.get("kDD").and_then(Value::as_array).unwrap();
        assert_eq!(k.get(&[0, 2]), k.get(&[2, 0]));
        assert_eq!(session.get("c"), Some(&Value::Constant("c".into())));
        assert_eq!(session.dimension(), Some(3));
    }

    #[test]
    fn inconsistent_dimension() {
        let mut session = Session::new();
        let err = parse(&mut session, "% define nosym uU (3), vU (4)").unwrap_err();
        assert_eq!(
            err.kind(),
            &ErrorKind::InconsistentDimension {
                declared: 4,
                ambient: 3
            }
        );
        assert_eq!(err.offset(), 23);
    }

    #[test]
    fn const_ignores_dimension() {
        let mut session = Session::new();
        parse(&mut session, "% define const c (4), nosym vU (3)").unwrap();
        assert_eq!(session.dimension(), Some(3));
    }

    #[test]
    fn missing_dimension() {
        let mut session = Session::new();
        let err = parse(&mut session, "% define nosym vU").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::DimensionRequired("vU".into()));
    }

    #[test]
    fn basis() {
        let mut session = Session::new();
        parse(&mut session, r"% define basis [r, \theta, \phi]").unwrap();
        assert_eq!(session.basis(), ["r", "theta", "phi"]);
        parse(&mut session, "% define basis [x, y]").unwrap();
        assert_eq!(session.basis(), ["x", "y"]);
    }

    #[test]
    fn duplicate_basis_symbol() {
        let mut session = Session::new();
        let err = parse(&mut session, "% define basis [x, y, x]").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::DuplicateBasisSymbol("x".into()));
        assert_eq!(err.offset(), 22);
    }

    #[test]
    fn derivative_convention() {
        let mut session = Session::new();
        parse(&mut session, "% define deriv _d").unwrap();
        assert_eq!(session.deriv_type(), DerivType::Stored);
        parse(&mut session, "% define deriv symbolic").unwrap();
        assert_eq!(session.deriv_type(), DerivType::Symbolic);
    }

    #[test]
    fn index_ranges() {
        let mut session = Session::new();
        parse(&mut session, "% define index [a-c] = 0:3, index i = 1:2").unwrap();
        assert_eq!(session.index_range("b"), Some((0, 4)));
        assert_eq!(session.index_range("i"), Some((1, 3)));
        let err = parse(&mut session, "% define index [c-a] = 0:3").unwrap_err();
        assert_eq!(
            err.kind(),
            &ErrorKind::InvalidIndexRange {
                first: "c".into(),
                last: "a".into()
            }
        );
    }

    #[test]
    fn redefinition_is_noticed() {
        let mut session = Session::new();
        parse(&mut session, "% define nosym vU (3)").unwrap();
        let defined = parse(&mut session, "% define nosym vU (3)").unwrap();
        assert!(defined.is_empty());
        assert_eq!(session.notices(), [Notice::Override("vU".into())]);
    }

    #[test]
    fn unsupported_macro() {
        let mut session = Session::new();
        let err = parse(&mut session, "% x").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::UnsupportedMacro);
        assert_eq!(err.offset(), 2);
    }

    #[test]
    fn assign_updates_metric() {
        let mut session = Session::new();
        parse(&mut session, "% define metric gDD (2)").unwrap();
        parse(&mut session, "g_{01} = 0; g_{10} = 0").unwrap();
        let defined = parse(&mut session, "% assign metric gDD").unwrap();
        assert_eq!(defined, vec!["gDD", "gUU", "gdet"]);
        let det = session.get("gdet").and_then(Value::as_scalar).unwrap();
        assert_eq!(det.to_string(), "gDD00*gDD11");
    }

    #[test]
    fn assign_undefined() {
        let mut session = Session::new();
        let err = parse(&mut session, "% assign metric gDD").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::UndefinedTensor("gDD".into()));
    }

    #[test]
    fn parse_directive() {
        let mut session = Session::new();
        let defined = parse(&mut session, "% parse x = 2").unwrap();
        assert_eq!(defined, vec!["x"]);
        assert_eq!(session.get("x"), Some(&Value::Scalar(symexpr::Expr::integer(2))));
    }
}
