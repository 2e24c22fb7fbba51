use serde::{Deserialize, Serialize};

/// Half-open character range `[start, end)` into a document's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// True if any span of `a` overlaps any span of `b`.
pub fn spans_overlap(a: &[Span], b: &[Span]) -> bool {
    a.iter().any(|x| b.iter().any(|y| x.overlaps(y)))
}

/// Storage form: `start|end` per span, spans joined by `;`.
pub fn span_str(spans: &[Span]) -> String {
    spans
        .iter()
        .map(|s| format!("{}|{}", s.start, s.end))
        .collect::<Vec<_>>()
        .join(";")
}

pub fn parse_span_str(s: &str) -> Option<Vec<Span>> {
    let mut spans = Vec::new();
    for part in s.split(';') {
        let (start, end) = part.split_once('|')?;
        let start: usize = start.trim().parse().ok()?;
        let end: usize = end.trim().parse().ok()?;
        if end < start {
            return None;
        }
        spans.push(Span::new(start, end));
    }
    if spans.is_empty() {
        None
    } else {
        Some(spans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_ranges() {
        assert!(Span::new(10, 20).overlaps(&Span::new(15, 25)));
        assert!(Span::new(15, 25).overlaps(&Span::new(10, 20)));
    }

    #[test]
    fn adjacent_ranges_do_not_overlap() {
        assert!(!Span::new(10, 20).overlaps(&Span::new(20, 30)));
        assert!(!Span::new(20, 30).overlaps(&Span::new(10, 20)));
    }

    #[test]
    fn containment_overlaps() {
        assert!(Span::new(0, 100).overlaps(&Span::new(40, 41)));
    }

    #[test]
    fn multi_span_overlap_uses_any_pair() {
        let a = [Span::new(0, 5), Span::new(30, 35)];
        let b = [Span::new(32, 40)];
        assert!(spans_overlap(&a, &b));
        assert!(!spans_overlap(&a, &[Span::new(5, 30)]));
    }

    #[test]
    fn span_str_format() {
        let spans = vec![Span::new(3, 8), Span::new(12, 20)];
        let s = span_str(&spans);
        assert_eq!(s, "3|8;12|20");
        assert_eq!(parse_span_str(&s), Some(spans));
        assert_eq!(parse_span_str("8|3"), None);
        assert_eq!(parse_span_str("garbage"), None);
    }
}
