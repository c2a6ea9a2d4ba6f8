use crate::genomics::likelihoods::{genotype_index, normalize_log10_in_place};
use crate::genomics::{AlleleSet, GenotypeLikelihoods};

/// Maps the ten dense SNP genotype slots onto the VCF genotype order of a
/// site's final allele set, where genotype `(i, j)` over allele indices
/// `i <= j` sits at `j(j+1)/2 + i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlOrdering {
    dense_slots: Vec<usize>,
}

impl PlOrdering {
    /// Build the ordering for `alleles` (reference first).
    pub fn new(alleles: &AlleleSet) -> Self {
        let bases: Vec<usize> = alleles.alleles().iter().map(|a| a.base().index()).collect();
        let mut dense_slots = vec![0; alleles.genotype_count()];
        for j in 0..bases.len() {
            for i in 0..=j {
                dense_slots[j * (j + 1) / 2 + i] = genotype_index(bases[i], bases[j]);
            }
        }
        Self { dense_slots }
    }

    /// Number of genotypes in the site ordering.
    pub fn len(&self) -> usize {
        self.dense_slots.len()
    }

    /// Whether the ordering is empty.
    pub fn is_empty(&self) -> bool {
        self.dense_slots.is_empty()
    }

    /// Dense slot feeding each output slot.
    pub fn dense_slots(&self) -> &[usize] {
        &self.dense_slots
    }

    /// Reindex `likelihoods` into site order and normalize so the best entry
    /// is exactly zero.
    pub fn remap(&self, likelihoods: &GenotypeLikelihoods) -> Vec<f64> {
        let dense = likelihoods.as_log10();
        let mut remapped: Vec<f64> = self.dense_slots.iter().map(|&slot| dense[slot]).collect();
        normalize_log10_in_place(&mut remapped);
        remapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::likelihoods::NUM_DIPLOID_GENOTYPES;
    use crate::genomics::Base;

    fn allele_set(reference: Base, alternates: &[Base]) -> AlleleSet {
        let mut set = AlleleSet::new(reference);
        for &alt in alternates {
            set.push_alternate(alt);
        }
        set
    }

    fn ramp() -> GenotypeLikelihoods {
        let mut log10 = [0.0; NUM_DIPLOID_GENOTYPES];
        for (idx, value) in log10.iter_mut().enumerate() {
            *value = -(idx as f64);
        }
        GenotypeLikelihoods::from_log10(log10)
    }

    #[test]
    fn biallelic_ordering_is_ref_het_alt() {
        let ordering = PlOrdering::new(&allele_set(Base::A, &[Base::G]));
        // AA, AG, GG
        assert_eq!(ordering.dense_slots(), &[0, 3, 5]);
    }

    #[test]
    fn alternate_order_is_respected() {
        let ordering = PlOrdering::new(&allele_set(Base::C, &[Base::T, Base::A]));
        // CC, CT, TT, AC, AT, AA
        assert_eq!(ordering.dense_slots(), &[2, 7, 9, 1, 6, 0]);
    }

    #[test]
    fn identity_order_keeps_normalized_values() {
        let ordering = PlOrdering::new(&allele_set(Base::A, &[Base::C, Base::G, Base::T]));
        let normalized = ramp().normalized();
        assert_eq!(ordering.remap(&normalized), normalized.as_log10().to_vec());
    }

    #[test]
    fn remap_normalizes_to_zero_max() {
        let ordering = PlOrdering::new(&allele_set(Base::T, &[Base::G]));
        // TT, GT, GG come from dense slots 9, 8, 5
        assert_eq!(ordering.remap(&ramp()), vec![-4.0, -3.0, 0.0]);
    }
}
