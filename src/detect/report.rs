use std::fmt;

/// Binary confusion matrix, jam being the positive class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionMatrix {
    pub true_negative: usize,
    pub false_positive: usize,
    pub false_negative: usize,
    pub true_positive: usize,
}

impl ConfusionMatrix {
    pub fn from_predictions(actual: &[bool], predicted: &[bool]) -> Self {
        let mut matrix = Self::default();
        for (&a, &p) in actual.iter().zip(predicted) {
            match (a, p) {
                (false, false) => matrix.true_negative += 1,
                (false, true) => matrix.false_positive += 1,
                (true, false) => matrix.false_negative += 1,
                (true, true) => matrix.true_positive += 1,
            }
        }
        matrix
    }

    pub fn total(&self) -> usize {
        self.true_negative + self.false_positive + self.false_negative + self.true_positive
    }

    pub fn accuracy(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => (self.true_negative + self.true_positive) as f64 / total as f64,
        }
    }

    /// F1 of the jam class; 0 when there is nothing to score
    pub fn f1(&self) -> f64 {
        let denom = 2 * self.true_positive + self.false_positive + self.false_negative;
        if denom == 0 {
            return 0.0;
        }
        (2 * self.true_positive) as f64 / denom as f64
    }
}

/// Outcome of scoring the held-out rows
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionReport {
    pub threshold: f64,
    pub core_samples: usize,
    pub train_rows: usize,
    pub matrix: ConfusionMatrix,
}

impl fmt::Display for DetectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.matrix;
        writeln!(f, "========== DBSCAN PHANTOM JAM DETECTION ==========")?;
        writeln!(
            f,
            "Trained on {} rows, {} core samples, distance threshold = {:.4}",
            self.train_rows, self.core_samples, self.threshold
        )?;
        writeln!(f, "Accuracy: {:.2}%", m.accuracy() * 100.0)?;
        writeln!(f, "F1 Score: {:.4}", m.f1())?;
        writeln!(f)?;
        writeln!(f, "Confusion Matrix (rows = actual, cols = predicted):")?;
        writeln!(f, "                Predicted Normal | Predicted Jam")?;
        writeln!(f, "Actual Normal : {:>16} | {:>13}", m.true_negative, m.false_positive)?;
        writeln!(f, "Actual Jam    : {:>16} | {:>13}", m.false_negative, m.true_positive)?;
        writeln!(f)?;
        writeln!(f, "---------- Summary ----------")?;
        writeln!(f, "Phantom jams detected (true positive): {}", m.true_positive)?;
        writeln!(f, "Phantom jams missed (false negative): {}", m.false_negative)?;
        writeln!(f, "False alarms (false positive): {}", m.false_positive)?;
        write!(f, "Correct non-jams (true negative): {}", m.true_negative)
    }
}
