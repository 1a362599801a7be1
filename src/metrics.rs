use std::cell::Cell;

use log::{debug, trace};
use serde::Serialize;

use crate::{
    confusion::ConfusionMatrix,
    error::{Error, Result},
    one_hot::to_one_hot,
};

/// Metrics computed from the counts pooled across every class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MicroMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f_measure: f64,
    /// Overall accuracy of the pooled counts.
    pub accuracy: f64,
}

/// Metrics computed per class, then averaged over the classes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MacroMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f_measure: f64,
    /// Average of the per-class accuracies.
    pub accuracy: f64,
}

/// Harmonic mean of a precision and a recall.
pub fn f_measure(precision: f64, recall: f64) -> f64 {
    2.0 * precision * recall / (precision + recall)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Totals {
    tp: usize,
    fp: usize,
    fn_: usize,
    tn: usize,
}

/// Accumulates one-vs-rest confusion counts for every class.
#[derive(Debug, Clone)]
pub struct MetricsAccumulator {
    /// The number of classes, valid class ids are `0..num_classes`.
    num_classes: usize,
    true_positives: Box<[usize]>,
    false_positives: Box<[usize]>,
    false_negatives: Box<[usize]>,
    true_negatives: Box<[usize]>,
    /// Cross-class sums, `None` once a mutation made them stale.
    totals: Cell<Option<Totals>>,
}

impl MetricsAccumulator {
    pub fn new(num_classes: usize) -> Result<Self> {
        if num_classes == 0 {
            return Err(Error::NoClasses);
        }
        debug!("creating metrics accumulator for {num_classes} classes");
        Ok(Self::zeroed(num_classes))
    }

    fn zeroed(num_classes: usize) -> Self {
        Self {
            num_classes,
            true_positives: vec![0; num_classes].into_boxed_slice(),
            false_positives: vec![0; num_classes].into_boxed_slice(),
            false_negatives: vec![0; num_classes].into_boxed_slice(),
            true_negatives: vec![0; num_classes].into_boxed_slice(),
            totals: Cell::new(None),
        }
    }

    #[inline]
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    fn check_class(&self, class_id: usize) -> Result<()> {
        if class_id < self.num_classes {
            Ok(())
        } else {
            Err(Error::ClassOutOfRange {
                class_id,
                num_classes: self.num_classes,
            })
        }
    }

    fn check_len(&self, len: usize) -> Result<()> {
        if len == self.num_classes {
            Ok(())
        } else {
            Err(Error::LabelLengthMismatch {
                expected: self.num_classes,
                actual: len,
            })
        }
    }

    /// Records whether `class_id` was predicted and whether it was the answer.
    pub fn add(&mut self, class_id: usize, pred: bool, answer: bool) -> Result<()> {
        self.check_class(class_id)?;
        self.record(class_id, pred, answer, 1);
        Ok(())
    }

    fn record(&mut self, class_id: usize, pred: bool, answer: bool, count: usize) {
        let counter = match (pred, answer) {
            (true, true) => &mut self.true_positives,
            (true, false) => &mut self.false_positives,
            (false, true) => &mut self.false_negatives,
            (false, false) => &mut self.true_negatives,
        };
        counter[class_id] += count;
        self.totals.set(None);
    }

    /// Records a single-label prediction as one binary outcome per class.
    pub fn add_by_class_id(&mut self, pred_class_id: usize, answer_class_id: usize) -> Result<()> {
        let pred = to_one_hot(pred_class_id, self.num_classes)?;
        let answer = to_one_hot(answer_class_id, self.num_classes)?;

        for (class_id, (&p, &a)) in pred.iter().zip(answer.iter()).enumerate() {
            self.record(class_id, p == 1.0, a == 1.0, 1);
        }
        Ok(())
    }

    /// Records a multi-label prediction, one indicator per class.
    pub fn add_by_labels(&mut self, pred_labels: &[bool], answer_labels: &[bool]) -> Result<()> {
        self.check_len(pred_labels.len())?;
        self.check_len(answer_labels.len())?;

        for (class_id, (&p, &a)) in pred_labels.iter().zip(answer_labels).enumerate() {
            self.record(class_id, p, a, 1);
        }
        Ok(())
    }

    /// Records every `(predicted, answer)` pair. Nothing is recorded if any pair is invalid.
    pub fn extend_class_ids(&mut self, predicted: &[usize], answers: &[usize]) -> Result<()> {
        if predicted.len() != answers.len() {
            return Err(Error::LabelLengthMismatch {
                expected: predicted.len(),
                actual: answers.len(),
            });
        }
        for &class_id in predicted.iter().chain(answers) {
            self.check_class(class_id)?;
        }

        debug!("recording {} single-label observations", predicted.len());
        for (&p, &a) in predicted.iter().zip(answers) {
            self.add_by_class_id(p, a)?;
        }
        Ok(())
    }

    /// Zeroes every counter.
    pub fn reset(&mut self) {
        debug!("resetting metrics accumulator");
        self.true_positives.fill(0);
        self.false_positives.fill(0);
        self.false_negatives.fill(0);
        self.true_negatives.fill(0);
        self.totals.set(None);
    }

    fn totals(&self) -> Totals {
        if let Some(totals) = self.totals.get() {
            return totals;
        }

        trace!("recomputing cached totals");
        let totals = Totals {
            tp: self.true_positives.iter().sum(),
            fp: self.false_positives.iter().sum(),
            fn_: self.false_negatives.iter().sum(),
            tn: self.true_negatives.iter().sum(),
        };
        self.totals.set(Some(totals));
        totals
    }

    pub fn total(&self) -> usize {
        let Totals { tp, fp, fn_, tn } = self.totals();
        tp + fp + fn_ + tn
    }

    pub fn total_tp(&self) -> usize {
        self.totals().tp
    }

    pub fn total_fp(&self) -> usize {
        self.totals().fp
    }

    pub fn total_fn(&self) -> usize {
        self.totals().fn_
    }

    pub fn total_tn(&self) -> usize {
        self.totals().tn
    }

    pub fn true_positives(&self, class_id: usize) -> Result<usize> {
        self.check_class(class_id)?;
        Ok(self.true_positives[class_id])
    }

    pub fn false_positives(&self, class_id: usize) -> Result<usize> {
        self.check_class(class_id)?;
        Ok(self.false_positives[class_id])
    }

    pub fn false_negatives(&self, class_id: usize) -> Result<usize> {
        self.check_class(class_id)?;
        Ok(self.false_negatives[class_id])
    }

    pub fn true_negatives(&self, class_id: usize) -> Result<usize> {
        self.check_class(class_id)?;
        Ok(self.true_negatives[class_id])
    }

    /// `TP / (TP + FP)` for the class, `NaN` if it was never predicted.
    pub fn precision(&self, class_id: usize) -> Result<f64> {
        self.check_class(class_id)?;
        Ok(self.precision_unchecked(class_id))
    }

    /// `TP / (TP + FN)` for the class, `NaN` if it was never the answer.
    pub fn recall(&self, class_id: usize) -> Result<f64> {
        self.check_class(class_id)?;
        Ok(self.recall_unchecked(class_id))
    }

    /// `(TP + TN) / (TP + FP + FN + TN)` for the class.
    pub fn accuracy(&self, class_id: usize) -> Result<f64> {
        self.check_class(class_id)?;
        Ok(self.accuracy_unchecked(class_id))
    }

    pub fn f_measure(&self, class_id: usize) -> Result<f64> {
        Ok(f_measure(self.precision(class_id)?, self.recall(class_id)?))
    }

    fn precision_unchecked(&self, c: usize) -> f64 {
        let tp = self.true_positives[c];
        tp as f64 / (tp + self.false_positives[c]) as f64
    }

    fn recall_unchecked(&self, c: usize) -> f64 {
        let tp = self.true_positives[c];
        tp as f64 / (tp + self.false_negatives[c]) as f64
    }

    fn accuracy_unchecked(&self, c: usize) -> f64 {
        let correct = self.true_positives[c] + self.true_negatives[c];
        let total = correct + self.false_positives[c] + self.false_negatives[c];
        correct as f64 / total as f64
    }

    pub fn micro_metrics(&self) -> MicroMetrics {
        let Totals { tp, fp, fn_, tn } = self.totals();
        let precision = tp as f64 / (tp + fp) as f64;
        let recall = tp as f64 / (tp + fn_) as f64;

        MicroMetrics {
            precision,
            recall,
            f_measure: f_measure(precision, recall),
            accuracy: (tp + tn) as f64 / (tp + fp + fn_ + tn) as f64,
        }
    }

    /// Averages of the per-class metrics. A single `NaN` class makes the
    /// matching average `NaN`.
    pub fn macro_metrics(&self) -> MacroMetrics {
        let (p, r, a) = (0..self.num_classes).fold((0.0, 0.0, 0.0), |(p, r, a), c| {
            (
                p + self.precision_unchecked(c),
                r + self.recall_unchecked(c),
                a + self.accuracy_unchecked(c),
            )
        });

        let n = self.num_classes as f64;
        let precision = p / n;
        let recall = r / n;

        MacroMetrics {
            precision,
            recall,
            f_measure: f_measure(precision, recall),
            accuracy: a / n,
        }
    }
}

impl From<&ConfusionMatrix> for MetricsAccumulator {
    /// Same counts as calling `add_by_class_id` once per recorded pair.
    fn from(matrix: &ConfusionMatrix) -> Self {
        let num_classes = matrix.num_classes();
        debug!("building metrics accumulator from a {num_classes}x{num_classes} confusion matrix");

        let mut acc = Self::zeroed(num_classes);

        for (actual, row) in matrix.rows().enumerate() {
            for (predicted, &count) in row.iter().enumerate() {
                if count == 0 {
                    continue;
                }
                for class_id in 0..num_classes {
                    acc.record(class_id, class_id == predicted, class_id == actual, count);
                }
            }
        }
        acc
    }
}
