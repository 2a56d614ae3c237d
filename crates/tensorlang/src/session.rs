//! The translation session.
//!
//! A [Session] holds everything that survives from one parse to the next: the
//! namespace of defined symbols, the coordinate basis, the derivative
//! convention, the index range table and the ambient dimension.
//! Every parse runs against a session passed by mutable reference; nested
//! parses started by macro expansion share the same session.

use crate::error::{Error, Notice};
use crate::parser::Parser;
use indexedexp::Array;
use std::collections::{HashMap, HashSet};
use std::fmt;
use symexpr::Expr;

/// Value bound to a symbol in the namespace.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// A scalar expression, from a scalar assignment or a fully indexed one.
    Scalar(Expr),
    /// Component storage of a tensor of rank one or more.
    Array(Array),
    /// A declared constant: stands for its own symbol.
    Constant(String),
}

impl Value {
    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Expr> {
        match self {
            Value::Scalar(expr) => Some(expr),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Scalar(expr) => write!(f, "{expr}"),
            Value::Array(array) => write!(f, "{array}"),
            Value::Constant(symbol) => write!(f, "{symbol}"),
        }
    }
}

/// How `\partial` derivatives of indexed quantities are represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DerivType {
    /// Unevaluated derivatives, evaluated against the basis.
    #[default]
    Symbolic,
    /// Derivatives stored as separate tensors with a `_d` suffix.
    Stored,
}

impl DerivType {
    pub fn from_lexeme(lexeme: &str) -> Option<DerivType> {
        match lexeme {
            "symbolic" => Some(DerivType::Symbolic),
            "_d" => Some(DerivType::Stored),
            _ => None,
        }
    }

    pub fn lexeme(self) -> &'static str {
        match self {
            DerivType::Symbolic => "symbolic",
            DerivType::Stored => "_d",
        }
    }
}

/// Index letters that range over `[0, 3)` unless redefined.
pub const SPATIAL_INDICES: [&str; 4] = ["i", "j", "k", "l"];

/// Persistent state shared by every parse.
#[derive(Debug)]
pub struct Session {
    pub(crate) namespace: HashMap<String, Value>,
    pub(crate) basis: Vec<String>,
    pub(crate) deriv: DerivType,
    pub(crate) ranges: HashMap<String, (usize, usize)>,
    pub(crate) dimension: Option<usize>,
    retention: bool,
    ignore_override: bool,
    notices: Vec<Notice>,
    pub(crate) code: Vec<String>,
    // symbols given storage by the current top-level parse
    pub(crate) declared: HashSet<String>,
}

impl Default for Session {
    fn default() -> Self {
        Session {
            namespace: HashMap::new(),
            basis: vec![],
            deriv: DerivType::default(),
            ranges: default_ranges(),
            dimension: None,
            retention: true,
            ignore_override: false,
            notices: vec![],
            code: vec![],
            declared: HashSet::new(),
        }
    }
}

fn default_ranges() -> HashMap<String, (usize, usize)> {
    SPATIAL_INDICES
        .iter()
        .map(|index| (index.to_string(), (0, 3)))
        .collect()
}

impl Session {
    pub fn new() -> Session {
        Default::default()
    }

    /// Parses one or more statements.
    ///
    /// Returns the names defined by this call, in order of first definition.
    pub fn parse(&mut self, text: &str) -> Result<Vec<String>, Error> {
        self.forget();
        self.code.clear();
        self.declared.clear();
        Parser::new(self, 0).parse(text)
    }

    /// Parses a standalone expression.
    ///
    /// References to scalars and constants come back as bare symbols.
    pub fn parse_expression(&mut self, text: &str) -> Result<Expr, Error> {
        Parser::new(self, 0).parse_expression(text)
    }

    pub fn get(&self, symbol: &str) -> Option<&Value> {
        self.namespace.get(symbol)
    }

    /// Defined symbols in alphabetical order.
    pub fn symbols(&self) -> Vec<&str> {
        let mut symbols: Vec<&str> = self.namespace.keys().map(String::as_str).collect();
        symbols.sort_unstable();
        symbols
    }

    /// Forgets every symbol and resets the global settings.
    pub fn clear_namespace(&mut self) {
        self.namespace.clear();
        self.declared.clear();
        self.reset_globals();
        self.dimension = None;
    }

    /// Sets whether declarations persist across parses.
    ///
    /// Turning retention off resets the basis, the derivative convention and
    /// the index ranges. Every later parse then starts with no ambient
    /// dimension, and a declaration allocates fresh storage even when an
    /// earlier parse already declared the symbol.
    pub fn set_retention(&mut self, retention: bool) {
        self.retention = retention;
        if !retention {
            self.reset_globals();
        }
    }

    pub fn retention(&self) -> bool {
        self.retention
    }

    /// Stops recording override notices.
    pub fn ignore_override(&mut self, ignore: bool) {
        self.ignore_override = ignore;
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Host code of every implied summation evaluated by the last parse,
    /// including those synthesized by macro expansion.
    pub fn code(&self) -> &[String] {
        &self.code
    }

    pub fn basis(&self) -> &[String] {
        &self.basis
    }

    pub fn deriv_type(&self) -> DerivType {
        self.deriv
    }

    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Half-open range of an index letter, if one has been set.
    pub fn index_range(&self, index: &str) -> Option<(usize, usize)> {
        self.ranges.get(index).copied()
    }

    // Without retention every top-level parse starts with no ambient
    // dimension. Values from earlier parses stay readable.
    fn forget(&mut self) {
        if !self.retention {
            self.dimension = None;
        }
    }

    fn reset_globals(&mut self) {
        self.basis.clear();
        self.deriv = DerivType::default();
        self.ranges = default_ranges();
    }

    pub(crate) fn notify_override(&mut self, symbol: &str) {
        if self.ignore_override {
            return;
        }
        tracing::warn!(symbol, "symbol already has storage; keeping it");
        self.notices.push(Notice::Override(symbol.to_string()));
    }
}
