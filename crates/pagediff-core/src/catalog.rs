//! The canonical difference list and its filtered views
//!
//! A difference is identified by its position in the sequence returned by the
//! compare service. Filtering and searching only ever hide entries; they never
//! reorder or renumber them.

use crate::model::{DiffKind, Difference, Side};
use std::fmt;
use std::str::FromStr;

/// Type filter of the catalog panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeFilter {
    #[default]
    All,
    Addition,
    Deletion,
    Modification,
}

impl TypeFilter {
    pub const ALL: [TypeFilter; 4] = [
        TypeFilter::All,
        TypeFilter::Addition,
        TypeFilter::Deletion,
        TypeFilter::Modification,
    ];

    pub fn matches(self, kind: DiffKind) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Addition => kind == DiffKind::Addition,
            TypeFilter::Deletion => kind == DiffKind::Deletion,
            TypeFilter::Modification => kind == DiffKind::Modification,
        }
    }

    /// Cycle to the next filter (wraps)
    pub fn next(self) -> TypeFilter {
        match self {
            TypeFilter::All => TypeFilter::Addition,
            TypeFilter::Addition => TypeFilter::Deletion,
            TypeFilter::Deletion => TypeFilter::Modification,
            TypeFilter::Modification => TypeFilter::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TypeFilter::All => "all",
            TypeFilter::Addition => "addition",
            TypeFilter::Deletion => "deletion",
            TypeFilter::Modification => "modification",
        }
    }
}

impl fmt::Display for TypeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TypeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "" => Ok(TypeFilter::All),
            "addition" | "added" | "add" => Ok(TypeFilter::Addition),
            "deletion" | "deleted" | "del" => Ok(TypeFilter::Deletion),
            "modification" | "modified" | "mod" => Ok(TypeFilter::Modification),
            other => Err(format!("unknown difference type: {other}")),
        }
    }
}

/// Search term plus type filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    pub search: String,
    pub filter: TypeFilter,
}

impl CatalogQuery {
    pub fn new(search: impl Into<String>, filter: TypeFilter) -> Self {
        Self {
            search: search.into(),
            filter,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.search.is_empty() && self.filter == TypeFilter::All
    }

    fn matches(&self, needle: &str, diff: &Difference) -> bool {
        if !self.filter.matches(diff.kind) {
            return false;
        }
        if needle.is_empty() {
            return true;
        }
        Side::BOTH.iter().any(|&side| {
            diff.text(side)
                .is_some_and(|text| text.to_lowercase().contains(needle))
        })
    }
}

/// Difference visible under a query, tagged with its global index
#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry<'a> {
    pub index: usize,
    pub diff: &'a Difference,
}

/// Number of differences per kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KindCounts {
    pub additions: usize,
    pub deletions: usize,
    pub modifications: usize,
}

impl KindCounts {
    pub fn total(&self) -> usize {
        self.additions + self.deletions + self.modifications
    }

    pub fn for_filter(&self, filter: TypeFilter) -> usize {
        match filter {
            TypeFilter::All => self.total(),
            TypeFilter::Addition => self.additions,
            TypeFilter::Deletion => self.deletions,
            TypeFilter::Modification => self.modifications,
        }
    }
}

/// Marker drawn in a pane's gutter next to a highlighted box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GutterMarker {
    pub index: usize,
    pub page_index: usize,
    /// Box top in document space
    pub y: f64,
    pub symbol: char,
}

/// Gutter symbol of a difference as seen from `side`.
///
/// Side A shows additions as `+` and deletions as `-`; side B swaps them.
/// Modifications are `~` on both sides.
pub fn gutter_symbol(kind: DiffKind, side: Side) -> char {
    match (kind, side) {
        (DiffKind::Modification, _) => '~',
        (DiffKind::Addition, Side::A) | (DiffKind::Deletion, Side::B) => '+',
        (DiffKind::Deletion, Side::A) | (DiffKind::Addition, Side::B) => '-',
    }
}

/// Owner of the canonical difference sequence
#[derive(Debug, Clone, Default)]
pub struct DiffCatalog {
    differences: Vec<Difference>,
}

impl DiffCatalog {
    pub fn new(differences: Vec<Difference>) -> Self {
        Self { differences }
    }

    pub fn is_empty(&self) -> bool {
        self.differences.is_empty()
    }

    pub fn len(&self) -> usize {
        self.differences.len()
    }

    pub fn get(&self, index: usize) -> Option<&Difference> {
        self.differences.get(index)
    }

    pub fn differences(&self) -> &[Difference] {
        &self.differences
    }

    /// Entries matching `query`, in original order, with their global indices
    pub fn filtered(&self, query: &CatalogQuery) -> Vec<CatalogEntry<'_>> {
        let needle = query.search.to_lowercase();
        self.differences
            .iter()
            .enumerate()
            .filter(|(_, diff)| query.matches(&needle, diff))
            .map(|(index, diff)| CatalogEntry { index, diff })
            .collect()
    }

    /// Global index of a record borrowed from this catalog.
    ///
    /// Lookup is by identity, so two records with equal contents still
    /// resolve to their own positions.
    pub fn index_of(&self, diff: &Difference) -> Option<usize> {
        self.differences
            .iter()
            .position(|candidate| std::ptr::eq(candidate, diff))
    }

    pub fn counts(&self) -> KindCounts {
        let mut counts = KindCounts::default();
        for diff in &self.differences {
            match diff.kind {
                DiffKind::Addition => counts.additions += 1,
                DiffKind::Deletion => counts.deletions += 1,
                DiffKind::Modification => counts.modifications += 1,
            }
        }
        counts
    }

    /// Highlights of `side` on `page` as `(local_index, global_index)` pairs
    pub fn page_highlights(&self, side: Side, page: usize) -> Vec<(usize, usize)> {
        self.differences
            .iter()
            .enumerate()
            .filter(|(_, diff)| diff.page_index == page && diff.has_side(side))
            .enumerate()
            .map(|(local, (global, _))| (local, global))
            .collect()
    }

    /// Position of difference `global` among the highlights of its page on `side`
    pub fn local_index(&self, side: Side, global: usize) -> Option<usize> {
        let diff = self.differences.get(global)?;
        if !diff.has_side(side) {
            return None;
        }
        let local = self.differences[..global]
            .iter()
            .filter(|d| d.page_index == diff.page_index && d.has_side(side))
            .count();
        Some(local)
    }

    pub fn gutter_markers(&self, side: Side) -> Vec<GutterMarker> {
        self.differences
            .iter()
            .enumerate()
            .filter_map(|(index, diff)| {
                let bbox = diff.bbox(side)?;
                Some(GutterMarker {
                    index,
                    page_index: diff.page_index,
                    y: bbox.y0,
                    symbol: gutter_symbol(diff.kind, side),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BBox;

    fn diff(page: usize, kind: DiffKind, text_a: Option<&str>, text_b: Option<&str>) -> Difference {
        let bbox = Some(BBox::new(10.0, 20.0 + page as f64, 50.0, 40.0));
        Difference {
            page_index: page,
            kind,
            bbox_a: if kind == DiffKind::Addition { None } else { bbox },
            bbox_b: if kind == DiffKind::Deletion { None } else { bbox },
            text_a: text_a.map(String::from),
            text_b: text_b.map(String::from),
            absolute_y_a: None,
            absolute_y_b: None,
        }
    }

    fn sample() -> DiffCatalog {
        DiffCatalog::new(vec![
            diff(0, DiffKind::Deletion, Some("Old Heading"), None),
            diff(0, DiffKind::Addition, None, Some("fresh paragraph")),
            diff(0, DiffKind::Modification, Some("total: 10"), Some("Total: 12")),
            diff(1, DiffKind::Addition, None, Some("appendix")),
            diff(1, DiffKind::Modification, Some("same"), Some("same")),
        ])
    }

    #[test]
    fn test_empty_query_matches_all() {
        let catalog = sample();
        let entries = catalog.filtered(&CatalogQuery::default());
        let indices: Vec<_> = entries.iter().map(|e| e.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_filter_keeps_global_indices() {
        let catalog = sample();
        let entries = catalog.filtered(&CatalogQuery::new("", TypeFilter::Addition));
        let indices: Vec<_> = entries.iter().map(|e| e.index).collect();
        assert_eq!(indices, vec![1, 3]);
        for entry in entries {
            assert!(std::ptr::eq(entry.diff, catalog.get(entry.index).unwrap()));
        }
    }

    #[test]
    fn test_search_is_case_insensitive_on_either_side() {
        let catalog = sample();
        let entries = catalog.filtered(&CatalogQuery::new("TOTAL", TypeFilter::All));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].index, 2);

        let entries = catalog.filtered(&CatalogQuery::new("heading", TypeFilter::All));
        assert_eq!(entries[0].index, 0);

        let entries = catalog.filtered(&CatalogQuery::new("heading", TypeFilter::Addition));
        assert!(entries.is_empty());
    }

    #[test]
    fn test_search_keeps_whitespace() {
        let catalog = DiffCatalog::new(vec![
            diff(0, DiffKind::Addition, None, Some("inline")),
            diff(0, DiffKind::Addition, None, Some("new line")),
        ]);
        let indices = |term: &str| -> Vec<usize> {
            catalog
                .filtered(&CatalogQuery::new(term, TypeFilter::All))
                .iter()
                .map(|e| e.index)
                .collect()
        };
        assert_eq!(indices(" line"), vec![1]);
        assert_eq!(indices(" "), vec![1]);
        assert_eq!(indices("  "), Vec::<usize>::new());
        assert_eq!(indices(""), vec![0, 1]);
    }

    #[test]
    fn test_index_of_uses_identity() {
        let catalog = sample();
        // Entry 4 has equal text on both sides; clones are not members
        let fourth = catalog.get(4).unwrap();
        assert_eq!(catalog.index_of(fourth), Some(4));
        let copy = fourth.clone();
        assert_eq!(catalog.index_of(&copy), None);
    }

    #[test]
    fn test_index_of_distinguishes_equal_records() {
        let twin = diff(0, DiffKind::Addition, None, Some("dup"));
        let catalog = DiffCatalog::new(vec![twin.clone(), twin]);
        assert_eq!(catalog.index_of(catalog.get(1).unwrap()), Some(1));
        assert_eq!(catalog.index_of(catalog.get(0).unwrap()), Some(0));
    }

    #[test]
    fn test_counts() {
        let counts = sample().counts();
        assert_eq!(counts.additions, 2);
        assert_eq!(counts.deletions, 1);
        assert_eq!(counts.modifications, 2);
        assert_eq!(counts.for_filter(TypeFilter::All), 5);
    }

    #[test]
    fn test_page_highlights_and_local_index() {
        let catalog = sample();
        assert_eq!(catalog.page_highlights(Side::A, 0), vec![(0, 0), (1, 2)]);
        assert_eq!(catalog.page_highlights(Side::B, 0), vec![(0, 1), (1, 2)]);
        assert_eq!(catalog.page_highlights(Side::B, 1), vec![(0, 3), (1, 4)]);
        assert_eq!(catalog.local_index(Side::B, 2), Some(1));
        assert_eq!(catalog.local_index(Side::A, 2), Some(1));
        assert_eq!(catalog.local_index(Side::A, 1), None);
        assert_eq!(catalog.local_index(Side::A, 4), Some(0));
        assert_eq!(catalog.local_index(Side::A, 99), None);
    }

    #[test]
    fn test_gutter_symbols_swap_per_side() {
        let catalog = sample();
        let a: Vec<_> = catalog.gutter_markers(Side::A).iter().map(|m| (m.index, m.symbol)).collect();
        assert_eq!(a, vec![(0, '-'), (2, '~'), (4, '~')]);
        let b: Vec<_> = catalog.gutter_markers(Side::B).iter().map(|m| (m.index, m.symbol)).collect();
        assert_eq!(b, vec![(1, '-'), (2, '~'), (3, '-'), (4, '~')]);
    }

    #[test]
    fn test_type_filter_parse_and_cycle() {
        assert_eq!("Addition".parse::<TypeFilter>(), Ok(TypeFilter::Addition));
        assert!("moved".parse::<TypeFilter>().is_err());
        let mut filter = TypeFilter::All;
        for _ in 0..4 {
            filter = filter.next();
        }
        assert_eq!(filter, TypeFilter::All);
    }
}
