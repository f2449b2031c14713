//! # Dataset Splitter
//!
//! Seeded train/test partitioning. The stratified variant keeps the label
//! proportions of every partition as close as integer counts allow.
//!
//! Both splitters are pure functions of `(items, ratio, seed)`: the same
//! input always yields the same partitions.

use oorandom::Rand64;
use tracing::debug;

use crate::data::record::{Label, LabelDistribution};
use crate::error::{Result, VeritasError};

/// The two sides of a split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition<T> {
    pub train: Vec<T>,
    pub test: Vec<T>,
}

/// Check that a split ratio lies strictly between 0 and 1.
pub fn validate_ratio(name: &str, ratio: f64) -> Result<()> {
    if !(ratio > 0.0 && ratio < 1.0) {
        return Err(VeritasError::Configuration(format!(
            "{} must be strictly between 0 and 1, got {}",
            name, ratio
        )));
    }
    Ok(())
}

/// Number of held-out rows for `n` items: `ceil(ratio * n)`.
///
/// Errors if either partition would end up empty.
pub fn test_count(n: usize, ratio: f64) -> Result<usize> {
    validate_ratio("test ratio", ratio)?;
    // Absorb float noise such as 0.3 * 10 = 3.0000000000000004.
    let n_test = (ratio * n as f64 - 1e-9).ceil().max(0.0) as usize;
    if n_test == 0 || n_test >= n {
        return Err(VeritasError::Configuration(format!(
            "test ratio {} leaves an empty partition for {} rows",
            ratio, n
        )));
    }
    Ok(n_test)
}

/// Shuffle a slice in place with a seeded Fisher-Yates pass.
pub fn shuffle<T>(items: &mut [T], rng: &mut Rand64) {
    for i in (1..items.len()).rev() {
        let j = rng.rand_range(0..(i as u64 + 1)) as usize;
        items.swap(i, j);
    }
}

/// Random partition without regard to labels.
pub fn random_split<T>(items: Vec<T>, test_size: f64, seed: u64) -> Result<Partition<T>> {
    let n = items.len();
    let n_test = test_count(n, test_size)?;

    let mut rng = Rand64::new(u128::from(seed));
    let mut order: Vec<usize> = (0..n).collect();
    shuffle(&mut order, &mut rng);

    let (test_idx, train_idx) = order.split_at(n_test);
    let partition = take_partition(items, train_idx, test_idx);
    debug!(
        train = partition.train.len(),
        test = partition.test.len(),
        seed,
        "random split"
    );
    Ok(partition)
}

/// Stratified partition on the label returned by `label_of`.
///
/// The held-out size is `ceil(test_size * n)`. It is apportioned over the
/// labels by largest remainder, so each label contributes
/// `round(test_size * count)` rows up to integer rounding.
pub fn stratified_split<T, F>(
    items: Vec<T>,
    test_size: f64,
    seed: u64,
    label_of: F,
) -> Result<Partition<T>>
where
    F: Fn(&T) -> Label,
{
    let n = items.len();
    let n_test = test_count(n, test_size)?;

    let mut groups: Vec<Vec<usize>> = vec![Vec::new(); Label::ALL.len()];
    for (idx, item) in items.iter().enumerate() {
        groups[usize::from(label_of(item).as_u8())].push(idx);
    }

    let quotas = apportion(n_test, n, &groups.iter().map(Vec::len).collect::<Vec<_>>());

    let mut rng = Rand64::new(u128::from(seed));
    let mut train_idx = Vec::with_capacity(n - n_test);
    let mut test_idx = Vec::with_capacity(n_test);
    for (group, quota) in groups.iter_mut().zip(quotas) {
        shuffle(group, &mut rng);
        let (test, train) = group.split_at(quota);
        test_idx.extend_from_slice(test);
        train_idx.extend_from_slice(train);
    }

    // Interleave labels inside each partition.
    shuffle(&mut train_idx, &mut rng);
    shuffle(&mut test_idx, &mut rng);

    let partition = take_partition(items, &train_idx, &test_idx);
    debug!(
        train = %LabelDistribution::from_labels(partition.train.iter().map(&label_of)),
        test = %LabelDistribution::from_labels(partition.test.iter().map(&label_of)),
        seed,
        "stratified split"
    );
    Ok(partition)
}

/// Largest-remainder apportionment of `n_test` rows over groups of the given sizes.
fn apportion(n_test: usize, n: usize, sizes: &[usize]) -> Vec<usize> {
    let mut quotas: Vec<usize> = sizes.iter().map(|&c| n_test * c / n).collect();
    let assigned: usize = quotas.iter().sum();

    let mut order: Vec<usize> = (0..sizes.len()).collect();
    // Largest remainder first, then the larger group, then label order.
    order.sort_by(|&a, &b| {
        let ra = n_test * sizes[a] % n;
        let rb = n_test * sizes[b] % n;
        rb.cmp(&ra).then(sizes[b].cmp(&sizes[a])).then(a.cmp(&b))
    });

    for &g in order.iter().take(n_test.saturating_sub(assigned)) {
        if quotas[g] < sizes[g] {
            quotas[g] += 1;
        }
    }
    quotas
}

fn take_partition<T>(items: Vec<T>, train_idx: &[usize], test_idx: &[usize]) -> Partition<T> {
    let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
    let mut take = |indices: &[usize]| -> Vec<T> {
        indices.iter().filter_map(|&i| slots[i].take()).collect()
    };
    let train = take(train_idx);
    let test = take(test_idx);
    Partition { train, test }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labeled(real: usize, fake: usize) -> Vec<(usize, Label)> {
        (0..real)
            .map(|i| (i, Label::Real))
            .chain((real..real + fake).map(|i| (i, Label::Fake)))
            .collect()
    }

    fn dist(items: &[(usize, Label)]) -> LabelDistribution {
        LabelDistribution::from_labels(items.iter().map(|(_, l)| *l))
    }

    #[test]
    fn seventy_thirty_on_ten_rows() {
        let part = stratified_split(labeled(6, 4), 0.3, 104, |(_, l)| *l).unwrap();
        assert_eq!(part.train.len(), 7);
        assert_eq!(part.test.len(), 3);

        let test = dist(&part.test);
        let train = dist(&part.train);
        assert_eq!((test.real, test.fake), (2, 1));
        assert_eq!((train.real, train.fake), (4, 3));
    }

    #[test]
    fn same_seed_same_partition() {
        let a = stratified_split(labeled(40, 25), 0.3, 7, |(_, l)| *l).unwrap();
        let b = stratified_split(labeled(40, 25), 0.3, 7, |(_, l)| *l).unwrap();
        assert_eq!(a, b);

        let c = random_split((0..50).collect::<Vec<_>>(), 0.25, 9).unwrap();
        let d = random_split((0..50).collect::<Vec<_>>(), 0.25, 9).unwrap();
        assert_eq!(c, d);
    }

    #[test]
    fn different_seed_changes_partition() {
        let a = random_split((0..100).collect::<Vec<_>>(), 0.3, 1).unwrap();
        let b = random_split((0..100).collect::<Vec<_>>(), 0.3, 2).unwrap();
        assert_ne!(a.test, b.test);
    }

    #[test]
    fn partitions_are_disjoint_and_complete() {
        let part = stratified_split(labeled(33, 17), 0.2, 3, |(_, l)| *l).unwrap();
        let mut all: Vec<usize> = part
            .train
            .iter()
            .chain(part.test.iter())
            .map(|(i, _)| *i)
            .collect();
        all.sort_unstable();
        assert_eq!(all, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn stratification_preserves_proportions() {
        let items = labeled(700, 300);
        let full = dist(&items).fake_ratio();
        for seed in [1, 2, 3] {
            let part = stratified_split(items.clone(), 0.3, seed, |(_, l)| *l).unwrap();
            assert!((dist(&part.train).fake_ratio() - full).abs() < 0.01);
            assert!((dist(&part.test).fake_ratio() - full).abs() < 0.01);
        }
    }

    #[test]
    fn invalid_ratios_are_configuration_errors() {
        for ratio in [0.0, 1.0, -0.1, 1.5, f64::NAN] {
            let err = random_split(vec![1, 2, 3], ratio, 0).unwrap_err();
            assert!(matches!(err, VeritasError::Configuration(_)));
        }
    }

    #[test]
    fn empty_partition_is_rejected() {
        let err = random_split(vec![1], 0.5, 0).unwrap_err();
        assert!(matches!(err, VeritasError::Configuration(_)));
    }

    #[test]
    fn apportion_follows_largest_remainder() {
        assert_eq!(apportion(3, 10, &[6, 4]), vec![2, 1]);
        assert_eq!(apportion(5, 10, &[5, 5]), vec![3, 2]);
        assert_eq!(apportion(3, 10, &[10, 0]), vec![3, 0]);
    }
}
