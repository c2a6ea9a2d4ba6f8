use std::collections::HashMap;

use crate::genomics::PileupElement;

/// Which strand's reads a per-sample pileup is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ReadOrientation {
    /// Keep every read.
    #[default]
    Complete,
    /// Forward-strand reads only.
    Forward,
    /// Reverse-strand reads only.
    Reverse,
}

/// Ordered base observations for one sample at one site.
///
/// Element order is significant and preserved by every transformation except
/// contamination downsampling, which re-sorts deterministically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pileup {
    elements: Vec<PileupElement>,
}

/// Elements of a pileup grouped into fragments.
#[derive(Debug, Clone, Default)]
pub struct FragmentCollection<'a> {
    /// Elements scored on their own.
    pub singletons: Vec<&'a PileupElement>,
    /// Overlapping mates, scored jointly.
    pub overlapping_pairs: Vec<[&'a PileupElement; 2]>,
}

impl Pileup {
    /// Construct a pileup from elements in read order.
    pub fn new(elements: Vec<PileupElement>) -> Self {
        Self { elements }
    }

    /// Pileup without any elements.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the pileup has no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Iterate elements in order.
    pub fn iter(&self) -> std::slice::Iter<'_, PileupElement> {
        self.elements.iter()
    }

    /// Borrow the elements.
    pub fn elements(&self) -> &[PileupElement] {
        &self.elements
    }

    /// Consume the pileup, returning its elements.
    pub fn into_elements(self) -> Vec<PileupElement> {
        self.elements
    }

    /// Restrict to the reads of one orientation, preserving order.
    pub fn stratify(&self, orientation: ReadOrientation) -> Pileup {
        match orientation {
            ReadOrientation::Complete => self.clone(),
            ReadOrientation::Forward => self.filter(|element| !element.is_reverse()),
            ReadOrientation::Reverse => self.filter(|element| element.is_reverse()),
        }
    }

    /// Elements satisfying `keep`, in order.
    pub fn filter<F>(&self, mut keep: F) -> Pileup
    where
        F: FnMut(&PileupElement) -> bool,
    {
        Pileup::new(
            self.elements
                .iter()
                .filter(|element| keep(element))
                .cloned()
                .collect(),
        )
    }

    /// Number of non-deletion elements whose observed base is A/C/G/T.
    pub fn filtered_depth(&self) -> u32 {
        self.elements
            .iter()
            .filter(|element| element.standard_base().is_some())
            .count() as u32
    }

    /// Group elements by read name: names seen exactly twice form an
    /// overlapping pair, everything else is a singleton. Both lists follow
    /// the order of first appearance.
    pub fn fragments(&self) -> FragmentCollection<'_> {
        let mut by_name: HashMap<&str, Vec<usize>> = HashMap::with_capacity(self.elements.len());
        for (idx, element) in self.elements.iter().enumerate() {
            by_name.entry(element.read_name()).or_default().push(idx);
        }

        let mut fragments = FragmentCollection::default();
        for (idx, element) in self.elements.iter().enumerate() {
            match by_name.get(element.read_name()).map(Vec::as_slice) {
                Some(&[first, second]) => {
                    if idx == first {
                        fragments
                            .overlapping_pairs
                            .push([&self.elements[first], &self.elements[second]]);
                    }
                }
                _ => fragments.singletons.push(element),
            }
        }
        fragments
    }
}

impl FromIterator<PileupElement> for Pileup {
    fn from_iter<I: IntoIterator<Item = PileupElement>>(iter: I) -> Self {
        Pileup::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Pileup {
    type Item = &'a PileupElement;
    type IntoIter = std::slice::Iter<'a, PileupElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::ReadObservation;

    fn element(name: &str, start: u32, base: u8, reverse: bool) -> PileupElement {
        ReadObservation::new(name, start, base, 30)
            .with_reverse_strand(reverse)
            .into()
    }

    #[test]
    fn stratify_keeps_order_within_strand() {
        let pileup = Pileup::new(vec![
            element("r1", 5, b'A', false),
            element("r2", 3, b'C', true),
            element("r3", 1, b'G', false),
        ]);

        let forward = pileup.stratify(ReadOrientation::Forward);
        let names: Vec<_> = forward.iter().map(|e| e.read_name()).collect();
        assert_eq!(names, vec!["r1", "r3"]);
        assert_eq!(pileup.stratify(ReadOrientation::Reverse).len(), 1);
        assert_eq!(pileup.stratify(ReadOrientation::Complete), pileup);
    }

    #[test]
    fn filtered_depth_ignores_non_standard_bases() {
        let pileup = Pileup::new(vec![
            element("r1", 1, b'A', false),
            element("r2", 1, b'N', false),
            element("r3", 1, b't', false),
        ]);
        assert_eq!(pileup.filtered_depth(), 2);
    }

    #[test]
    fn filtered_depth_ignores_deletions() {
        let mut elements: Vec<PileupElement> = (0..10)
            .map(|i| element(&format!("r{i}"), 1, b'G', false))
            .collect();
        for i in 0..3 {
            elements.push(
                ReadObservation::new(format!("del{i}"), 1, b'G', 30)
                    .with_deletion(true)
                    .into(),
            );
        }
        assert_eq!(Pileup::new(elements).filtered_depth(), 10);
    }

    #[test]
    fn fragments_pair_mates_by_read_name() {
        let pileup = Pileup::new(vec![
            element("pair", 1, b'A', false),
            element("solo", 2, b'C', false),
            element("pair", 4, b'A', true),
            element("triple", 1, b'G', false),
            element("triple", 2, b'G', false),
            element("triple", 3, b'G', false),
        ]);

        let fragments = pileup.fragments();
        assert_eq!(fragments.overlapping_pairs.len(), 1);
        assert_eq!(fragments.overlapping_pairs[0][0].alignment_start(), 1);
        assert_eq!(fragments.overlapping_pairs[0][1].alignment_start(), 4);
        assert_eq!(fragments.singletons.len(), 4);
        assert_eq!(fragments.singletons[0].read_name(), "solo");
    }
}
