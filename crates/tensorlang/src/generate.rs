//! LaTeX synthesis for macro expansion.
//!
//! Christoffel symbols, covariant derivatives and raised covariant derivatives
//! are not evaluated directly. Instead the parser writes out their definition
//! in the input language and parses it in a nested parse.

use crate::error::ErrorKind;
use crate::session::DerivType;
use crate::tensor::{self, Index, Tensor, Variance};

const ALPHABET: std::ops::RangeInclusive<char> = 'a'..='z';

// First lowercase letter that is not in use.
fn fresh_letter<S: AsRef<str>>(in_use: &[S]) -> String {
    ALPHABET
        .map(String::from)
        .find(|letter| in_use.iter().all(|used| used.as_ref() != letter))
        .unwrap_or_else(|| "z".to_string())
}

fn index_latex(index: &str) -> String {
    if index.chars().count() > 1 && !index.chars().all(|c| c.is_ascii_digit()) {
        format!("\\{index}")
    } else {
        index.to_string()
    }
}

fn decorated(name: &str, diacritic: &str) -> String {
    if diacritic.is_empty() {
        name.to_string()
    } else {
        format!("\\{diacritic}{{{name}}}")
    }
}

/// Whether a symbol names a Christoffel symbol: `Gamma`, optionally
/// decorated, with one upper and two lower slots.
pub fn is_christoffel(symbol: &str) -> bool {
    matches!(
        symbol,
        "GammaUDD" | "GammabarUDD" | "GammahatUDD" | "GammatildeUDD"
    )
}

/// Definition of a Christoffel symbol from its metric.
///
/// The definition always uses the free indices `a b c` and the bound index
/// `d`; a reference with other indices reads the components computed here.
pub fn christoffel(symbol: &str, dimension: usize) -> String {
    let diacritic = tensor::base_name(symbol)
        .strip_prefix("Gamma")
        .unwrap_or_default();
    let gamma = decorated(r"\Gamma", diacritic);
    let metric = decorated("g", diacritic);
    format!(
        "% define metric {metric}UU ({dimension});\n\
         {gamma}^a_{{b c}} = \\frac{{1}}{{2}} {metric}^{{a d}} \
         (\\partial_b {metric}_{{c d}} + \\partial_c {metric}_{{d b}} - \\partial_d {metric}_{{b c}})"
    )
}

/// Product rule expansion of a covariant derivative with lower operator
/// indices.
///
/// The order-`n` derivative is the partial derivative of the order-`n-1`
/// expansion plus one connection term for every slot of the order-`n-1`
/// object: `+` for upper slots and `-` for lower slots.
pub fn covariant_derivative(
    tensor: &Tensor,
    operators: &[String],
    deriv: DerivType,
    diacritic: &str,
) -> String {
    let mut indexing: Vec<String> = tensor
        .indices()
        .map(Index::to_string)
        .chain(operators.iter().cloned())
        .collect();
    for i in 0..indexing.len() {
        if indexing[..i].contains(&indexing[i]) {
            indexing[i] = fresh_letter(&indexing);
        }
    }
    let nabla = decorated(r"\nabla", diacritic);
    let gamma = decorated(r"\Gamma", diacritic);
    let rank = tensor.rank();
    let mut lhs = String::new();
    if deriv != DerivType::Symbolic {
        lhs.push_str(&format!("% define deriv {};\n", deriv.lexeme()));
    }
    for index in &indexing[rank..] {
        lhs.push_str(&format!("{nabla}_{} ", index_latex(index)));
    }
    lhs.push_str(&relabel(tensor, &indexing[..rank]));
    let generator = Generator {
        tensor,
        gamma: &gamma,
    };
    format!(
        "{lhs} = {}",
        generator.expansion(operators.len(), &indexing)
    )
}

struct Generator<'a> {
    tensor: &'a Tensor,
    gamma: &'a str,
}

impl Generator<'_> {
    fn expansion(&self, order: usize, indexing: &[String]) -> String {
        let rank = self.tensor.rank();
        if order == 0 {
            return relabel(self.tensor, &indexing[..rank]);
        }
        // the outermost operator acts on the derivative by the remaining ones
        let position = indexing.len() - order;
        let operator = index_latex(&indexing[position]);
        let inner = self.expansion(order - 1, indexing);
        let mut result = format!("\\partial_{operator} ({inner})");
        let slots = (0..rank).chain(position + 1..indexing.len());
        for slot in slots {
            let bound = fresh_letter(indexing);
            let mut replaced = indexing.to_vec();
            replaced[slot] = bound.clone();
            let inner = self.expansion(order - 1, &replaced);
            let index = index_latex(&indexing[slot]);
            let variance = if slot < rank {
                self.tensor.indexing[slot].1
            } else {
                Variance::Lower
            };
            let gamma = self.gamma;
            match variance {
                Variance::Upper => result.push_str(&format!(
                    " + {gamma}^{index}_{{{bound} {operator}}} ({inner})"
                )),
                Variance::Lower => result.push_str(&format!(
                    " - {gamma}^{bound}_{{{index} {operator}}} ({inner})"
                )),
            }
        }
        result
    }
}

// LaTeX of the tensor with its slots relabelled.
fn relabel(tensor: &Tensor, labels: &[String]) -> String {
    let indexing = tensor
        .indexing
        .iter()
        .zip(labels)
        .map(|((_, variance), label)| {
            let index = match label.parse::<usize>() {
                Ok(n) => Index::Fixed(n),
                Err(_) => Index::letter(label.as_str()),
            };
            (index, *variance)
        })
        .collect();
    Tensor {
        symbol: tensor.symbol.clone(),
        dimension: tensor.dimension,
        indexing,
    }
    .latex_format()
}

/// Definition of a covariant derivative with at least one upper operator
/// index, in terms of the lowered derivative and the inverse metric.
pub fn raised_covariant_derivative(
    tensor: &Tensor,
    operators: &[(String, Variance)],
    deriv: DerivType,
    diacritic: &str,
    dimension: Option<usize>,
) -> Result<String, ErrorKind> {
    let nabla = decorated(r"\nabla", diacritic);
    let metric = decorated("g", diacritic);
    let rank = tensor.rank();
    let mut in_use: Vec<String> = tensor
        .indices()
        .map(Index::to_string)
        .chain(operators.iter().map(|(index, _)| index.clone()))
        .collect();
    for i in 0..in_use.len() {
        if in_use[..i].contains(&in_use[i]) {
            in_use[i] = fresh_letter(&in_use);
        }
    }
    let labels = in_use.clone();
    let mut lhs = String::new();
    let mut factors = String::new();
    let mut lowered = String::new();
    if deriv != DerivType::Symbolic {
        lowered.push_str(&format!("\\vphantom{{{}}} ", deriv.lexeme()));
    }
    for (index, (_, variance)) in labels[rank..].iter().zip(operators) {
        let latex = index_latex(index);
        match variance {
            Variance::Upper => {
                lhs.push_str(&format!("{nabla}^{latex} "));
                let bound = fresh_letter(&in_use);
                in_use.push(bound.clone());
                factors.push_str(&format!("{metric}^{{{latex} {bound}}} "));
                lowered.push_str(&format!("{nabla}_{bound} "));
            }
            Variance::Lower => {
                lhs.push_str(&format!("{nabla}_{latex} "));
                lowered.push_str(&format!("{nabla}_{latex} "));
            }
        }
    }
    let reference = relabel(tensor, &labels[..rank]);
    let dimension =
        dimension.ok_or_else(|| ErrorKind::DimensionInference(format!("{metric}UU")))?;
    Ok(format!(
        "% define metric {metric}UU ({dimension});\n{lhs}{reference} = {factors}{lowered}{reference}"
    ))
}
