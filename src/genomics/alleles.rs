use tracing::debug;

use crate::genomics::likelihoods::{genotype_alleles, genotype_index};
use crate::genomics::{Allele, AlleleSet, Base, GenotypeLikelihoods, Locus, NUM_BASES};
use crate::CallError;

/// Propose alternate alleles from per-sample genotype likelihoods.
///
/// For every sample whose best genotype is not hom-ref, the gap between the
/// best and the hom-ref likelihood is credited to each non-reference base of
/// the best genotype (once per base). Bases with a strictly positive total
/// become alternates, in base order.
pub fn discover_alternate_alleles<'a, I>(reference: Base, samples: I) -> Vec<Allele>
where
    I: IntoIterator<Item = &'a GenotypeLikelihoods>,
{
    let ref_idx = reference.index();
    let hom_ref = genotype_index(ref_idx, ref_idx);
    let mut likelihood_sums = [0.0f64; NUM_BASES];

    for likelihoods in samples {
        let best = likelihoods.best_index();
        if best == hom_ref {
            continue;
        }
        let values = likelihoods.as_log10();
        let gap = values[best] - values[hom_ref];
        let (first, second) = genotype_alleles(best);
        if first != ref_idx {
            likelihood_sums[first] += gap;
        }
        if second != ref_idx && second != first {
            likelihood_sums[second] += gap;
        }
    }

    Base::ALL
        .into_iter()
        .filter(|base| likelihood_sums[base.index()] > 0.0)
        .map(Allele::alternate)
        .collect()
}

/// Alleles declared at a locus by an external truth set. Element 0 is the
/// reference; alleles are raw allele strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TruthAlleles {
    /// Reference allele followed by alternates.
    pub alleles: Vec<Vec<u8>>,
}

impl TruthAlleles {
    /// Construct from a reference allele and alternates.
    pub fn new(reference: impl Into<Vec<u8>>, alternates: Vec<Vec<u8>>) -> Self {
        let mut alleles = vec![reference.into()];
        alleles.extend(alternates);
        Self { alleles }
    }

    /// Reference allele, if the record has one.
    pub fn reference(&self) -> Option<&[u8]> {
        self.alleles.first().map(Vec::as_slice)
    }

    /// Alternate alleles.
    pub fn alternates(&self) -> &[Vec<u8>] {
        self.alleles.get(1..).unwrap_or(&[])
    }
}

/// Source of known alleles for genotyping at given sites.
pub trait TruthSource: Send + Sync {
    /// Alleles recorded at `locus`, if any.
    fn fetch_truth_alleles(&self, locus: &Locus) -> Option<TruthAlleles>;
}

/// How a site's alternate alleles are chosen.
#[derive(Debug, Clone, Copy)]
pub enum AllelePolicy<'a> {
    /// Use this list verbatim; element 0 stands for the reference.
    Fixed(&'a [Allele]),
    /// Take alternates from an external truth source.
    Truth(&'a dyn TruthSource),
    /// Infer alternates from the sample likelihoods.
    Discover,
}

impl std::fmt::Debug for dyn TruthSource + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TruthSource")
    }
}

/// Outcome of allele resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedAlleles {
    /// Alleles to genotype, reference first.
    Alleles(AlleleSet),
    /// The site should not be called.
    NoCall,
}

impl<'a> AllelePolicy<'a> {
    /// Resolve the allele set for `locus`. `samples` are the per-sample
    /// likelihoods, consulted only by [`AllelePolicy::Discover`].
    pub fn resolve<'s, I>(
        &self,
        locus: &Locus,
        reference: Base,
        samples: I,
    ) -> Result<ResolvedAlleles, CallError>
    where
        I: IntoIterator<Item = &'s GenotypeLikelihoods>,
    {
        let mut alleles = AlleleSet::new(reference);
        match *self {
            AllelePolicy::Fixed(fixed) => {
                for allele in fixed.iter().skip(1) {
                    if allele.base() == reference {
                        return Err(CallError::ReferenceAsAlternate {
                            locus: locus.clone(),
                            base: reference,
                        });
                    }
                    alleles.push_alternate(allele.base());
                }
            }
            AllelePolicy::Truth(source) => {
                let Some(truth) = source.fetch_truth_alleles(locus) else {
                    debug!(%locus, "no truth record; skipping site");
                    return Ok(ResolvedAlleles::NoCall);
                };
                if truth.reference().map(snp_base) != Some(Some(reference)) {
                    return Err(CallError::TruthReferenceMismatch {
                        locus: locus.clone(),
                        reference,
                        truth: String::from_utf8_lossy(truth.reference().unwrap_or_default())
                            .into_owned(),
                    });
                }
                for raw in truth.alternates() {
                    let base = snp_base(raw).ok_or_else(|| CallError::NonSnpTruthAllele {
                        locus: locus.clone(),
                        allele: String::from_utf8_lossy(raw).into_owned(),
                    })?;
                    if base == reference {
                        return Err(CallError::ReferenceAsAlternate {
                            locus: locus.clone(),
                            base,
                        });
                    }
                    alleles.push_alternate(base);
                }
                if alleles.alternates().is_empty() {
                    debug!(%locus, "truth record has no SNP alternate; skipping site");
                    return Ok(ResolvedAlleles::NoCall);
                }
            }
            AllelePolicy::Discover => {
                for allele in discover_alternate_alleles(reference, samples) {
                    alleles.push_alternate(allele.base());
                }
            }
        }
        Ok(ResolvedAlleles::Alleles(alleles))
    }
}

fn snp_base(raw: &[u8]) -> Option<Base> {
    match raw {
        [symbol] => Base::from_ascii(*symbol),
        _ => None,
    }
}

/// Any base other than `reference`, used to keep a monomorphic site's
/// output well-formed.
pub fn placeholder_alternate(reference: Base) -> Base {
    if reference == Base::A {
        Base::C
    } else {
        Base::A
    }
}
