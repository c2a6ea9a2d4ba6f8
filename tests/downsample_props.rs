use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use snpgl::genomics::{ContaminationDownsampler, Pileup};

mod common;
use common::{count_base, observation};

fn pileup_strategy() -> impl Strategy<Value = Pileup> {
    proptest::collection::vec(
        prop_oneof![Just(b'A'), Just(b'C'), Just(b'G'), Just(b'T'), Just(b'N')],
        0..120,
    )
    .prop_map(|bases| {
        bases
            .into_iter()
            .enumerate()
            .map(|(idx, base)| observation(idx as u32, base, 30))
            .collect::<Pileup>()
    })
}

proptest! {
    #[test]
    fn zero_fraction_is_identity(pileup in pileup_strategy(), seed in any::<u64>()) {
        let downsampler = ContaminationDownsampler::new(0.0).unwrap();
        let kept = downsampler.downsample(&pileup, &mut StdRng::seed_from_u64(seed));
        prop_assert_eq!(kept, pileup);
    }

    #[test]
    fn full_fraction_is_empty(pileup in pileup_strategy(), seed in any::<u64>()) {
        let downsampler = ContaminationDownsampler::new(1.0).unwrap();
        let kept = downsampler.downsample(&pileup, &mut StdRng::seed_from_u64(seed));
        prop_assert!(kept.is_empty());
    }

    #[test]
    fn same_seed_reproduces_kept_set(
        pileup in pileup_strategy(),
        fraction in 0.0f64..1.0,
        seed in any::<u64>(),
    ) {
        let downsampler = ContaminationDownsampler::new(fraction).unwrap();
        let first = downsampler.downsample(&pileup, &mut StdRng::seed_from_u64(seed));
        let second = downsampler.downsample(&pileup, &mut StdRng::seed_from_u64(seed));
        prop_assert_eq!(first, second);
    }

    #[test]
    fn each_stratum_loses_the_same_absolute_count(
        pileup in pileup_strategy(),
        fraction in 0.001f64..1.0,
        seed in any::<u64>(),
    ) {
        let downsampler = ContaminationDownsampler::new(fraction).unwrap();
        let kept = downsampler.downsample(&pileup, &mut StdRng::seed_from_u64(seed));
        let to_remove = (pileup.len() as f64 * fraction).ceil() as usize;

        prop_assert_eq!(count_base(&kept, b'N'), 0);
        for base in [b'A', b'C', b'G', b'T'] {
            let before = count_base(&pileup, base);
            let expected = if before > to_remove { before - to_remove } else { 0 };
            prop_assert_eq!(count_base(&kept, base), expected);
        }

        let keys: Vec<_> = kept
            .iter()
            .map(|e| (e.alignment_start(), e.read_name().to_string()))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        prop_assert_eq!(keys, sorted);
    }
}
