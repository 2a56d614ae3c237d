//! Tensor references.
//!
//! Inside parsed expressions a tensor reference is the uninterpreted function
//! application `Tensor(symbol, index...)` and a declared constant is
//! `Constant(symbol)`. Indices are symbols for letters and integers for fixed
//! components. The variance of each slot is not stored in the node; it is read
//! back from the `U`/`D` suffixes of the symbol name, so `gUD` has one upper
//! and one lower slot.

use crate::token;
use symexpr::Expr;

pub(crate) const TENSOR: &str = "Tensor";
pub(crate) const CONSTANT: &str = "Constant";

const DIACRITICS: [&str; 3] = ["bar", "hat", "tilde"];

/// Variance of an index slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Variance {
    Upper,
    Lower,
}

impl Variance {
    pub fn code(self) -> char {
        match self {
            Variance::Upper => 'U',
            Variance::Lower => 'D',
        }
    }

    pub fn from_code(c: char) -> Option<Variance> {
        match c {
            'U' => Some(Variance::Upper),
            'D' => Some(Variance::Lower),
            _ => None,
        }
    }

    pub fn flip(self) -> Variance {
        match self {
            Variance::Upper => Variance::Lower,
            Variance::Lower => Variance::Upper,
        }
    }
}

/// Index in a tensor slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Index {
    /// An index letter such as `i` or `alpha`.
    Letter(String),
    /// A fixed component.
    Fixed(usize),
}

impl Index {
    pub fn letter<S: Into<String>>(name: S) -> Index {
        Index::Letter(name.into())
    }

    fn latex(&self) -> String {
        match self {
            Index::Letter(name) if name.chars().count() > 1 => format!("\\{name}"),
            Index::Letter(name) => name.clone(),
            Index::Fixed(n) => n.to_string(),
        }
    }

    fn to_expr(&self) -> Expr {
        match self {
            Index::Letter(name) => Expr::symbol(name.as_str()),
            Index::Fixed(n) => Expr::integer(*n as i64),
        }
    }

    fn from_expr(expr: &Expr) -> Option<Index> {
        match expr {
            Expr::Symbol(name) => Some(Index::Letter(name.clone())),
            Expr::Number(n) => n
                .as_integer()
                .and_then(|n| usize::try_from(n).ok())
                .map(Index::Fixed),
            _ => None,
        }
    }
}

impl std::fmt::Display for Index {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Index::Letter(name) => write!(f, "{name}"),
            Index::Fixed(n) => write!(f, "{n}"),
        }
    }
}

/// A tensor reference: a symbol with indexed slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tensor {
    pub symbol: String,
    pub dimension: Option<usize>,
    pub indexing: Vec<(Index, Variance)>,
}

impl Tensor {
    /// Builds a reference from a symbol and its indices, reading the variance
    /// of each slot from the symbol.
    pub fn new<S: Into<String>>(symbol: S, indices: Vec<Index>) -> Tensor {
        let symbol = symbol.into();
        let variances = padded_variance(&symbol, indices.len());
        Tensor {
            indexing: indices.into_iter().zip(variances).collect(),
            symbol,
            dimension: None,
        }
    }

    pub fn with_dimension(mut self, dimension: Option<usize>) -> Tensor {
        self.dimension = dimension;
        self
    }

    pub fn rank(&self) -> usize {
        self.indexing.len()
    }

    pub fn indices(&self) -> impl Iterator<Item = &Index> {
        self.indexing.iter().map(|(index, _)| index)
    }

    /// Array form of the reference, e.g. `gDD[i][j]`.
    pub fn array_format(&self) -> String {
        let mut result = self.symbol.clone();
        for (index, _) in &self.indexing {
            result.push_str(&format!("[{index}]"));
        }
        result
    }

    /// LaTeX form of the reference, e.g. `g_{i j}` for `gDD[i][j]`.
    ///
    /// Comma derivatives (`vU_dD`) render with the derivative indices after a
    /// comma, and covariant derivatives (`vU_cdD`) as `\nabla` operators, so
    /// that parsing the output gives back the same reference.
    pub fn latex_format(&self) -> String {
        let (base, _) = split_variance(first_segment(&self.symbol));
        let base_rank = variance_of(first_segment(&self.symbol)).len();
        let split = base_rank.min(self.indexing.len());
        let (own, extra) = self.indexing.split_at(split);
        let mut upper = vec![];
        let mut lower = vec![];
        for (index, variance) in own {
            match variance {
                Variance::Upper => upper.push(index.latex()),
                Variance::Lower => lower.push(index.latex()),
            }
        }
        let suffix = &self.symbol[first_segment(&self.symbol).len()..];
        let mut prefix = String::new();
        if suffix.starts_with("_d") {
            let derivatives: Vec<String> = extra.iter().map(|(index, _)| index.latex()).collect();
            let list = lower.join(" ");
            let mut result = latex_symbol(base);
            if !upper.is_empty() {
                result.push_str(&group('^', &upper));
            }
            result.push_str(&format!("_{{{list},{}}}", derivatives.join(" ")));
            return result;
        }
        if let Some(diacritic) = suffix.strip_prefix("_cd") {
            let diacritic = diacritic.trim_end_matches(['U', 'D']);
            let nabla = if diacritic.is_empty() {
                r"\nabla".to_string()
            } else {
                format!(r"\{diacritic}{{\nabla}}")
            };
            for (index, variance) in extra {
                let script = match variance {
                    Variance::Upper => '^',
                    Variance::Lower => '_',
                };
                prefix.push_str(&format!("{nabla}{script}{} ", index.latex()));
            }
        }
        let mut result = prefix;
        result.push_str(&latex_symbol(base));
        if !upper.is_empty() {
            result.push_str(&group('^', &upper));
        }
        if !lower.is_empty() {
            result.push_str(&group('_', &lower));
        }
        result
    }

    /// The expression node for this reference.
    pub fn to_node(&self) -> Expr {
        let mut args = vec![Expr::symbol(self.symbol.as_str())];
        args.extend(self.indices().map(Index::to_expr));
        Expr::apply(TENSOR, args)
    }

    /// Reads a `Tensor(...)` node back.
    pub fn from_node(expr: &Expr) -> Option<Tensor> {
        match expr {
            Expr::Apply(name, args) if name == TENSOR => {
                let (symbol, indices) = args.split_first()?;
                let Expr::Symbol(symbol) = symbol else {
                    return None;
                };
                let indices = indices
                    .iter()
                    .map(Index::from_expr)
                    .collect::<Option<Vec<_>>>()?;
                Some(Tensor::new(symbol.as_str(), indices))
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for Tensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.latex_format())
    }
}

fn group(script: char, indices: &[String]) -> String {
    if indices.len() == 1 {
        format!("{script}{}", indices[0])
    } else {
        format!("{script}{{{}}}", indices.join(" "))
    }
}

// The part of a symbol before any `_d` or `_cd` suffix.
fn first_segment(symbol: &str) -> &str {
    symbol.split('_').next().unwrap_or(symbol)
}

// Splits the trailing run of variance codes off a name segment.
fn split_variance(segment: &str) -> (&str, &str) {
    let base = segment.trim_end_matches(['U', 'D']);
    if base.is_empty() {
        // A bare `D` or `U` is a name, not a variance.
        return (segment, "");
    }
    segment.split_at(base.len())
}

/// LaTeX for a bare symbol name: `gbar` is `\bar{g}`, `alpha` is `\alpha`,
/// and other multi-letter names use `\mathop`.
pub fn latex_symbol(name: &str) -> String {
    for diacritic in DIACRITICS {
        if let Some(letter) = name.strip_suffix(diacritic) {
            if !letter.is_empty() && is_letter(letter) {
                return format!(r"\{diacritic}{{{}}}", latex_letter(letter));
            }
        }
    }
    if is_letter(name) {
        latex_letter(name)
    } else {
        format!(r"\mathop{{{name}}}")
    }
}

fn is_letter(name: &str) -> bool {
    name.chars().count() == 1 || token::is_greek(name)
}

fn latex_letter(name: &str) -> String {
    if name.chars().count() > 1 {
        format!("\\{name}")
    } else {
        name.to_string()
    }
}

/// Variance of every slot named by a symbol.
///
/// Each `_`-separated segment contributes its trailing run of `U`/`D`
/// codes: `vU_dD` has slots `[Upper, Lower]`.
pub fn variance_of(symbol: &str) -> Vec<Variance> {
    symbol
        .split('_')
        .flat_map(|segment| {
            let (_, codes) = split_variance(segment);
            codes.chars().filter_map(Variance::from_code)
        })
        .collect()
}

// Variance for `count` slots, padded with lower slots.
fn padded_variance(symbol: &str, count: usize) -> Vec<Variance> {
    let mut variances = variance_of(symbol);
    variances.resize(count, Variance::Lower);
    variances
}

/// The base name of a symbol, without variance codes or derivative suffixes.
pub fn base_name(symbol: &str) -> &str {
    split_variance(first_segment(symbol)).0
}

/// Name of a symbol with every variance code in its first segment flipped:
/// the inverse of the metric `gDD` is `gUU`.
pub fn flip_variance(symbol: &str) -> String {
    let first = first_segment(symbol);
    let (base, codes) = split_variance(first);
    let flipped: String = codes
        .chars()
        .filter_map(Variance::from_code)
        .map(|v| v.flip().code())
        .collect();
    format!("{base}{flipped}{}", &symbol[first.len()..])
}

pub(crate) fn constant_node(symbol: &str) -> Expr {
    Expr::apply(CONSTANT, vec![Expr::symbol(symbol)])
}

pub(crate) fn constant_of(expr: &Expr) -> Option<&str> {
    match expr {
        Expr::Apply(name, args) if name == CONSTANT => match args.as_slice() {
            [Expr::Symbol(symbol)] => Some(symbol),
            _ => None,
        },
        _ => None,
    }
}
