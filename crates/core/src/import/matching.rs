//! Closest-match lookup used to turn "unknown office 'Londn'" into
//! "did you mean 'London'?".

/// Case-insensitive edit distance between two strings.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Find the best candidate for `value`.
///
/// An exact case-insensitive match wins, then a substring match in either
/// direction (shortest candidate first), then the smallest edit distance
/// within `max(2, len / 3)`.
pub fn closest_match<'a>(value: &str, candidates: &'a [String]) -> Option<&'a str> {
    let needle = value.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    if let Some(exact) = candidates.iter().find(|c| c.trim().to_lowercase() == needle) {
        return Some(exact.as_str());
    }

    let substring = candidates
        .iter()
        .filter(|c| {
            let hay = c.trim().to_lowercase();
            !hay.is_empty() && (hay.contains(&needle) || needle.contains(&hay))
        })
        .min_by_key(|c| c.len());
    if let Some(found) = substring {
        return Some(found.as_str());
    }

    let threshold = (needle.chars().count() / 3).max(2);
    candidates
        .iter()
        .map(|c| (levenshtein(&needle, &c.trim().to_lowercase()), c))
        .filter(|(d, _)| *d <= threshold)
        .min_by_key(|(d, _)| *d)
        .map(|(_, c)| c.as_str())
}

/// Whether `value` is one of `candidates`, ignoring case and padding.
pub fn contains_ignore_case(candidates: &[String], value: &str) -> bool {
    let needle = value.trim().to_lowercase();
    candidates.iter().any(|c| c.trim().to_lowercase() == needle)
}
