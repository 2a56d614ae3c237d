//! Spelling suggestions for unsupported commands.
//!
//! Words are compared by Levenshtein distance. The table is computed one row
//! at a time, so only two rows of the dynamic programming matrix are alive.

/// Levenshtein distance between two words.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];
    for (i, ca) in a.chars().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            current[j + 1] = if ca == *cb {
                previous[j]
            } else {
                1 + previous[j].min(previous[j + 1]).min(current[j])
            };
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

/// The dictionary word closest to `word`, if it is close enough to be a
/// plausible misspelling.
pub fn closest<'a>(dictionary: &[&'a str], word: &str) -> Option<&'a str> {
    let max_distance = (word.chars().count() / 3).max(1);
    dictionary
        .iter()
        .map(|candidate| (levenshtein_distance(word, candidate), *candidate))
        .filter(|(distance, _)| *distance <= max_distance)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, candidate)| candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distances() {
        assert_eq!(levenshtein_distance("", ""), 0);
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("sin", "sinh"), 1);
        assert_eq!(levenshtein_distance("abc", ""), 3);
    }

    #[test]
    fn suggestions() {
        let dictionary = ["sqrt", "frac", "partial"];
        assert_eq!(closest(&dictionary, "sqr"), Some("sqrt"));
        assert_eq!(closest(&dictionary, "partail"), Some("partial"));
        assert_eq!(closest(&dictionary, "mathrm"), None);
    }
}
