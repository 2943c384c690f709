use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

pub fn fuzzy_score(needle: &str, hay: &str) -> Option<i64> {
    let m = SkimMatcherV2::default();
    m.fuzzy_match(hay, needle)
}

/// Index of the name equal to `query`, else of the best fuzzy match.
pub fn best_match<'a>(query: &str, names: impl IntoIterator<Item = &'a str>) -> Option<usize> {
    let mut best: Option<(i64, usize)> = None;
    for (i, name) in names.into_iter().enumerate() {
        if name == query {
            return Some(i);
        }
        if let Some(score) = fuzzy_score(query, name) {
            if best.map_or(true, |(s, _)| score > s) {
                best = Some((score, i));
            }
        }
    }
    best.map(|(_, i)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_beats_fuzzy() {
        let names = ["System.Collections", "System", "Sys"];
        assert_eq!(best_match("System", names), Some(1));
        assert_eq!(best_match("coll", names), Some(0));
        assert_eq!(best_match("qq", names), None);
    }
}
