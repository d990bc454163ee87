use crate::keywords;

/// Whether a peg counts positively.
///
/// With `require_keywords` the comment must name at least one value keyword
/// and penalty keywords are ignored. Without it, any penalty keyword
/// disqualifies the peg.
pub fn is_valid<S: AsRef<str>>(
    comment: &str,
    require_keywords: bool,
    keywords: &[S],
    penalty_keywords: &[S],
) -> bool {
    if require_keywords {
        keywords::matches(comment, keywords)
    } else {
        !keywords::matches(comment, penalty_keywords)
    }
}

/// A deliberate penalty: names a penalty keyword and no value keyword.
pub fn is_penalty_override<S: AsRef<str>>(
    comment: &str,
    keywords: &[S],
    penalty_keywords: &[S],
) -> bool {
    keywords::matches(comment, penalty_keywords) && !keywords::matches(comment, keywords)
}

/// Whether a sender who already gave `already_given` pegs this cycle may give
/// another one. Penalty overrides bypass the allowance.
pub fn can_give<S: AsRef<str>>(
    already_given: usize,
    limit: Option<usize>,
    comment: &str,
    keywords: &[S],
    penalty_keywords: &[S],
) -> bool {
    match limit {
        None => true,
        Some(limit) if already_given < limit => true,
        Some(_) => is_penalty_override(comment, keywords, penalty_keywords),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEYWORDS: [&str; 2] = ["brave", "awesome"];
    const PENALTIES: [&str; 1] = ["shame"];

    #[test]
    fn required_keyword_wins_over_penalty() {
        assert!(is_valid(
            "you were brave and also a bit shame",
            true,
            &KEYWORDS,
            &PENALTIES
        ));
        assert!(!is_valid("shame on you", true, &KEYWORDS, &PENALTIES));
        assert!(!is_valid("nice job", true, &KEYWORDS, &PENALTIES));
    }

    #[test]
    fn optional_keywords_only_reject_penalties() {
        assert!(is_valid("nice job", false, &KEYWORDS, &PENALTIES));
        assert!(!is_valid("SHAME on you", false, &KEYWORDS, &PENALTIES));
        assert!(!is_valid(
            "brave but shame",
            false,
            &KEYWORDS,
            &PENALTIES
        ));
    }

    #[test]
    fn penalty_override_requires_no_value_keyword() {
        assert!(is_penalty_override("shame on you", &KEYWORDS, &PENALTIES));
        assert!(!is_penalty_override("brave, shame", &KEYWORDS, &PENALTIES));
        assert!(!is_penalty_override("nice job", &KEYWORDS, &PENALTIES));
    }

    #[test]
    fn allowance_blocks_extra_pegs_unless_penalty() {
        assert!(can_give(10, None, "brave", &KEYWORDS, &PENALTIES));
        assert!(can_give(2, Some(3), "brave", &KEYWORDS, &PENALTIES));
        assert!(!can_give(3, Some(3), "brave", &KEYWORDS, &PENALTIES));
        assert!(can_give(3, Some(3), "shame", &KEYWORDS, &PENALTIES));
    }
}
