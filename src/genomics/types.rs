use std::fmt;
use std::sync::Arc;

/// Number of canonical DNA bases (A, C, G, T).
pub const NUM_BASES: usize = 4;

/// Highest Phred score a base quality is clamped to.
pub const MAX_PHRED_QUALITY: u8 = 93;

/// One of the four canonical DNA bases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Base {
    /// Adenine.
    A = 0,
    /// Cytosine.
    C = 1,
    /// Guanine.
    G = 2,
    /// Thymine.
    T = 3,
}

impl Base {
    /// All bases in dense-index order.
    pub const ALL: [Base; NUM_BASES] = [Base::A, Base::C, Base::G, Base::T];

    /// Parse an ASCII symbol. Anything other than A/C/G/T (either case) is
    /// non-standard and yields `None`.
    pub fn from_ascii(symbol: u8) -> Option<Self> {
        match symbol {
            b'A' | b'a' => Some(Base::A),
            b'C' | b'c' => Some(Base::C),
            b'G' | b'g' => Some(Base::G),
            b'T' | b't' => Some(Base::T),
            _ => None,
        }
    }

    /// Base for a dense index in `0..4`.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Dense index in `0..4`.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Uppercase ASCII symbol.
    pub fn to_ascii(self) -> u8 {
        match self {
            Base::A => b'A',
            Base::C => b'C',
            Base::G => b'G',
            Base::T => b'T',
        }
    }
}

impl fmt::Display for Base {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_ascii() as char)
    }
}

/// A single-base allele. Alleles compare by base only; the reference flag is
/// carried for serializers.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Allele {
    base: Base,
    is_reference: bool,
}

impl Allele {
    /// Reference allele for `base`.
    pub fn reference(base: Base) -> Self {
        Self {
            base,
            is_reference: true,
        }
    }

    /// Alternate allele for `base`.
    pub fn alternate(base: Base) -> Self {
        Self {
            base,
            is_reference: false,
        }
    }

    /// Base carried by the allele.
    pub fn base(&self) -> Base {
        self.base
    }

    /// Whether this allele is the site's reference.
    pub fn is_reference(&self) -> bool {
        self.is_reference
    }
}

impl PartialEq for Allele {
    fn eq(&self, other: &Self) -> bool {
        self.base == other.base
    }
}

impl Eq for Allele {}

impl fmt::Display for Allele {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_reference {
            write!(f, "{}*", self.base)
        } else {
            write!(f, "{}", self.base)
        }
    }
}

/// Ordered alleles for one site. Element 0 is always the reference; the order
/// of the alternates determines the PL layout of every sample at the site.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AlleleSet {
    alleles: Vec<Allele>,
}

impl AlleleSet {
    /// Set containing only the reference allele.
    pub fn new(reference: Base) -> Self {
        Self {
            alleles: vec![Allele::reference(reference)],
        }
    }

    /// Append an alternate allele. Duplicates are ignored so the set never
    /// contains the same base twice.
    pub fn push_alternate(&mut self, base: Base) {
        let allele = Allele::alternate(base);
        if !self.alleles.contains(&allele) {
            self.alleles.push(allele);
        }
    }

    /// Reference allele.
    pub fn reference(&self) -> Allele {
        self.alleles[0]
    }

    /// Alternate alleles in order.
    pub fn alternates(&self) -> &[Allele] {
        &self.alleles[1..]
    }

    /// All alleles, reference first.
    pub fn alleles(&self) -> &[Allele] {
        &self.alleles
    }

    /// Number of alleles including the reference.
    pub fn len(&self) -> usize {
        self.alleles.len()
    }

    /// Always false: the reference is always present.
    pub fn is_empty(&self) -> bool {
        self.alleles.is_empty()
    }

    /// Number of diploid genotypes over these alleles, `k(k+1)/2`.
    pub fn genotype_count(&self) -> usize {
        let k = self.len();
        k * (k + 1) / 2
    }
}

/// Reference position of a site.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Locus {
    /// Contig/chromosome name.
    pub contig: Arc<str>,
    /// 1-based position on the contig.
    pub position: u32,
}

impl Locus {
    /// Construct a new locus.
    pub fn new(contig: impl Into<Arc<str>>, position: u32) -> Self {
        Self {
            contig: contig.into(),
            position,
        }
    }
}

impl fmt::Display for Locus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.contig, self.position)
    }
}

/// One aligned read's observation at a site, exactly as the pileup builder
/// produced it. Never mutated once built.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadObservation {
    /// Read name; mates of one fragment share it.
    pub read_name: Arc<str>,
    /// Leftmost reference coordinate of the alignment.
    pub alignment_start: u32,
    /// Offset of the observed base within the read.
    pub read_offset: usize,
    /// Observed base as ASCII (may be non-standard, e.g. `N`).
    pub base: u8,
    /// Phred-scaled base quality.
    pub quality: u8,
    /// Phred-scaled mapping quality.
    pub mapping_quality: u8,
    /// Read maps to the reverse strand.
    pub is_reverse: bool,
    /// The read has a deletion at this site.
    pub is_deletion: bool,
    /// Base is adjacent to an insertion or deletion.
    pub adjacent_to_indel: bool,
    /// Base is adjacent to a soft clip.
    pub adjacent_to_soft_clip: bool,
}

impl ReadObservation {
    /// Forward-strand, non-deletion observation with mapping quality 60.
    pub fn new(
        read_name: impl Into<Arc<str>>,
        alignment_start: u32,
        base: u8,
        quality: u8,
    ) -> Self {
        Self {
            read_name: read_name.into(),
            alignment_start,
            read_offset: 0,
            base,
            quality,
            mapping_quality: 60,
            is_reverse: false,
            is_deletion: false,
            adjacent_to_indel: false,
            adjacent_to_soft_clip: false,
        }
    }

    /// Set the offset of the base within the read.
    pub fn with_read_offset(mut self, offset: usize) -> Self {
        self.read_offset = offset;
        self
    }

    /// Set the mapping quality.
    pub fn with_mapping_quality(mut self, mapping_quality: u8) -> Self {
        self.mapping_quality = mapping_quality;
        self
    }

    /// Mark the read as reverse-strand.
    pub fn with_reverse_strand(mut self, is_reverse: bool) -> Self {
        self.is_reverse = is_reverse;
        self
    }

    /// Mark the observation as a deletion.
    pub fn with_deletion(mut self, is_deletion: bool) -> Self {
        self.is_deletion = is_deletion;
        self
    }

    /// Set the indel / soft-clip adjacency flags.
    pub fn with_adjacency(mut self, adjacent_to_indel: bool, adjacent_to_soft_clip: bool) -> Self {
        self.adjacent_to_indel = adjacent_to_indel;
        self.adjacent_to_soft_clip = adjacent_to_soft_clip;
        self
    }
}

/// A pileup entry: a shared original observation plus an optional effective
/// quality override. Overriding never touches the original.
#[derive(Debug, Clone, PartialEq)]
pub struct PileupElement {
    observation: Arc<ReadObservation>,
    quality_override: Option<u8>,
}

impl PileupElement {
    /// Wrap an observation without any override.
    pub fn new(observation: ReadObservation) -> Self {
        Self {
            observation: Arc::new(observation),
            quality_override: None,
        }
    }

    /// New element sharing this observation but reporting `quality`.
    pub fn with_quality(&self, quality: u8) -> Self {
        Self {
            observation: Arc::clone(&self.observation),
            quality_override: Some(quality),
        }
    }

    /// The original observation.
    pub fn observation(&self) -> &ReadObservation {
        &self.observation
    }

    /// Effective quality: the override when present, otherwise the original.
    pub fn quality(&self) -> u8 {
        self.quality_override.unwrap_or(self.observation.quality)
    }

    /// Whether the effective quality differs in origin from the observation.
    pub fn is_quality_adjusted(&self) -> bool {
        self.quality_override.is_some()
    }

    /// Observed base as ASCII.
    pub fn base(&self) -> u8 {
        self.observation.base
    }

    /// Observed base when it is A/C/G/T. Deletions carry no base.
    pub fn standard_base(&self) -> Option<Base> {
        if self.observation.is_deletion {
            return None;
        }
        Base::from_ascii(self.observation.base)
    }

    /// Read name.
    pub fn read_name(&self) -> &str {
        &self.observation.read_name
    }

    /// Alignment start of the read.
    pub fn alignment_start(&self) -> u32 {
        self.observation.alignment_start
    }

    /// Offset of the base within the read.
    pub fn read_offset(&self) -> usize {
        self.observation.read_offset
    }

    /// Mapping quality of the read.
    pub fn mapping_quality(&self) -> u8 {
        self.observation.mapping_quality
    }

    /// Read maps to the reverse strand.
    pub fn is_reverse(&self) -> bool {
        self.observation.is_reverse
    }

    /// Read has a deletion here.
    pub fn is_deletion(&self) -> bool {
        self.observation.is_deletion
    }
}

impl From<ReadObservation> for PileupElement {
    fn from(observation: ReadObservation) -> Self {
        Self::new(observation)
    }
}
