use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Row indices of a train/test partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffle each class separately and move `round(n * test_size)` of its rows
/// to the test side, so both sides keep the jam ratio. A class always keeps
/// at least one training row. The same seed gives the same split.
pub fn stratified_split(labels: &[bool], test_size: f64, seed: u64) -> Split {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(labels.len());
    let mut test = Vec::new();

    for class in [false, true] {
        let mut rows: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, &label)| label == class)
            .map(|(i, _)| i)
            .collect();
        rows.shuffle(&mut rng);

        let n_test = ((rows.len() as f64 * test_size).round() as usize).min(rows.len().saturating_sub(1));
        test.extend(rows.drain(..n_test));
        train.extend(rows);
    }

    Split { train, test }
}
