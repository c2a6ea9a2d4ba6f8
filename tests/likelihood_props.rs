use proptest::prelude::*;
use snpgl::genomics::likelihoods::genotype_index;
use snpgl::genomics::{discover_alternate_alleles, AlleleSet, Base, GenotypeLikelihoods, PlOrdering};

fn base_strategy() -> impl Strategy<Value = Base> {
    (0usize..4).prop_map(|idx| Base::from_index(idx).unwrap())
}

fn likelihoods_strategy() -> impl Strategy<Value = GenotypeLikelihoods> {
    proptest::array::uniform10(-50.0f64..0.0).prop_map(GenotypeLikelihoods::from_log10)
}

fn allele_set_strategy() -> impl Strategy<Value = AlleleSet> {
    (base_strategy(), Just(Base::ALL.to_vec()).prop_shuffle(), 0usize..4).prop_map(
        |(reference, shuffled, extra)| {
            let mut set = AlleleSet::new(reference);
            for base in shuffled.into_iter().filter(|&b| b != reference).take(extra) {
                set.push_alternate(base);
            }
            set
        },
    )
}

proptest! {
    #[test]
    fn remap_has_one_slot_per_genotype_and_zero_max(
        alleles in allele_set_strategy(),
        likelihoods in likelihoods_strategy(),
    ) {
        let k = alleles.len();
        let remapped = PlOrdering::new(&alleles).remap(&likelihoods);
        prop_assert_eq!(remapped.len(), k * (k + 1) / 2);

        let max = remapped.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        prop_assert_eq!(max, 0.0);
        prop_assert!(remapped.iter().all(|&v| v <= 0.0));
    }

    #[test]
    fn remap_is_a_strict_reindex(
        alleles in allele_set_strategy(),
        likelihoods in likelihoods_strategy(),
    ) {
        let ordering = PlOrdering::new(&alleles);
        let remapped = ordering.remap(&likelihoods);
        let dense = likelihoods.as_log10();
        let shift = remapped
            .iter()
            .zip(ordering.dense_slots())
            .map(|(value, &slot)| dense[slot] - value)
            .collect::<Vec<_>>();
        for delta in &shift {
            prop_assert!((delta - shift[0]).abs() < 1e-9);
        }
    }

    #[test]
    fn identity_order_leaves_normalized_vectors_unchanged(likelihoods in likelihoods_strategy()) {
        let mut identity = AlleleSet::new(Base::A);
        for base in [Base::C, Base::G, Base::T] {
            identity.push_alternate(base);
        }
        let normalized = likelihoods.normalized();
        let remapped = PlOrdering::new(&identity).remap(&normalized);
        prop_assert_eq!(remapped, normalized.as_log10().to_vec());
    }

    #[test]
    fn hom_ref_everywhere_discovers_nothing(
        reference in base_strategy(),
        samples in proptest::collection::vec(likelihoods_strategy(), 0..8),
    ) {
        let hom_ref = genotype_index(reference.index(), reference.index());
        let samples: Vec<GenotypeLikelihoods> = samples
            .into_iter()
            .map(|gl| {
                let mut log10 = *gl.as_log10();
                log10[hom_ref] = 1.0;
                GenotypeLikelihoods::from_log10(log10)
            })
            .collect();
        prop_assert!(discover_alternate_alleles(reference, &samples).is_empty());
    }

    #[test]
    fn discovered_alleles_are_sorted_non_reference(
        reference in base_strategy(),
        samples in proptest::collection::vec(likelihoods_strategy(), 1..8),
    ) {
        let alternates = discover_alternate_alleles(reference, &samples);
        prop_assert!(alternates.iter().all(|a| a.base() != reference && !a.is_reference()));
        prop_assert!(alternates.windows(2).all(|w| w[0].base() < w[1].base()));
        prop_assert!(alternates.len() <= 3);
    }
}
