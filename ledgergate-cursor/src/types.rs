//! Direction, absolute anchors, and the resolved anchor tuple.

use mongodb::bson::Bson;

/// Which side of the anchor a page covers.
///
/// Output order is descending either way; `Since` only scans ascending
/// to locate the window adjacent to the anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Documents strictly preceding the anchor.
    From,
    /// Documents strictly following the anchor.
    Since,
}

impl Direction {
    /// Comparison operator applied at each step of the lexicographic walk.
    pub(crate) fn comparator(self) -> &'static str {
        match self {
            Direction::From => "$lt",
            Direction::Since => "$gt",
        }
    }

    /// Scan order used to locate the window (`-1` descending, `1` ascending).
    pub(crate) fn scan_order(self) -> i32 {
        match self {
            Direction::From => -1,
            Direction::Since => 1,
        }
    }
}

/// The four absolute anchor keywords.
///
/// `Latest`/`Earliest` belong to time-ordered entities, `Most`/`Least`
/// to quantity-ordered ones; each entity's route accepts the pair that
/// fits its domain, and the engine treats the analogues identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbsoluteAnchor {
    Latest,
    Earliest,
    Most,
    Least,
}

impl AbsoluteAnchor {
    /// Parse a path keyword. Unknown keywords fall through to the
    /// entity's natural-key parsers.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "latest" => Some(AbsoluteAnchor::Latest),
            "earliest" => Some(AbsoluteAnchor::Earliest),
            "most" => Some(AbsoluteAnchor::Most),
            "least" => Some(AbsoluteAnchor::Least),
            _ => None,
        }
    }

    /// True for the anchors sitting above every document.
    pub fn is_upper_bound(self) -> bool {
        matches!(self, AbsoluteAnchor::Latest | AbsoluteAnchor::Most)
    }
}

/// An anchor resolved to a concrete point in the entity's composite
/// sort order. Values align one-to-one with the sort key fields.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorTuple(pub Vec<Bson>);

impl AnchorTuple {
    pub fn values(&self) -> &[Bson] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_parse() {
        assert_eq!(AbsoluteAnchor::from_keyword("latest"), Some(AbsoluteAnchor::Latest));
        assert_eq!(AbsoluteAnchor::from_keyword("earliest"), Some(AbsoluteAnchor::Earliest));
        assert_eq!(AbsoluteAnchor::from_keyword("most"), Some(AbsoluteAnchor::Most));
        assert_eq!(AbsoluteAnchor::from_keyword("least"), Some(AbsoluteAnchor::Least));
        assert_eq!(AbsoluteAnchor::from_keyword("newest"), None);
    }

    #[test]
    fn bound_sides() {
        assert!(AbsoluteAnchor::Latest.is_upper_bound());
        assert!(AbsoluteAnchor::Most.is_upper_bound());
        assert!(!AbsoluteAnchor::Earliest.is_upper_bound());
        assert!(!AbsoluteAnchor::Least.is_upper_bound());
    }

    #[test]
    fn comparators_follow_direction() {
        assert_eq!(Direction::From.comparator(), "$lt");
        assert_eq!(Direction::Since.comparator(), "$gt");
        assert_eq!(Direction::From.scan_order(), -1);
        assert_eq!(Direction::Since.scan_order(), 1);
    }
}
