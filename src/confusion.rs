use crate::error::{Error, Result};

/// Full confusion matrix, indexed as `[actual][predicted]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix(Box<[Box<[usize]>]>);

impl ConfusionMatrix {
    #[inline]
    pub fn num_classes(&self) -> usize {
        self.0.len()
    }

    /// Number of samples of class `actual` that were predicted as `predicted`.
    pub fn count(&self, actual: usize, predicted: usize) -> Result<usize> {
        self.check_class(actual)?;
        self.check_class(predicted)?;
        Ok(self.0[actual][predicted])
    }

    /// Rows of the matrix, one per actual class.
    pub fn rows(&self) -> impl Iterator<Item = &[usize]> {
        self.0.iter().map(|row| &row[..])
    }

    pub fn total(&self) -> usize {
        self.0.iter().flatten().sum()
    }

    /// Sum of the diagonal, the samples whose prediction matched.
    pub fn correct(&self) -> usize {
        (0..self.num_classes()).map(|c| self.0[c][c]).sum()
    }

    /// Fraction of all samples predicted correctly, `NaN` when empty.
    pub fn accuracy(&self) -> f64 {
        self.correct() as f64 / self.total() as f64
    }

    /// Fraction of the samples of `class` that were predicted as `class`.
    pub fn recall(&self, class: usize) -> Result<f64> {
        self.check_class(class)?;
        let answered: usize = self.0[class].iter().sum();
        Ok(self.0[class][class] as f64 / answered as f64)
    }

    /// Fraction of the samples predicted as `class` that really were `class`.
    pub fn precision(&self, class: usize) -> Result<f64> {
        self.check_class(class)?;
        let predicted: usize = self.rows().map(|row| row[class]).sum();
        Ok(self.0[class][class] as f64 / predicted as f64)
    }

    fn check_class(&self, class_id: usize) -> Result<()> {
        if class_id < self.num_classes() {
            Ok(())
        } else {
            Err(Error::ClassOutOfRange {
                class_id,
                num_classes: self.num_classes(),
            })
        }
    }
}

/// Compute the confusion matrix from a list of predicted and actual labels.
pub fn confusion_matrix(
    predicted: &[usize],
    actual: &[usize],
    num_classes: usize,
) -> Result<ConfusionMatrix> {
    if num_classes == 0 {
        return Err(Error::NoClasses);
    }
    if predicted.len() != actual.len() {
        return Err(Error::LabelLengthMismatch {
            expected: predicted.len(),
            actual: actual.len(),
        });
    }

    let mut matrix =
        vec![vec![0usize; num_classes].into_boxed_slice(); num_classes].into_boxed_slice();

    for (&p, &a) in predicted.iter().zip(actual.iter()) {
        if let Some(&class_id) = [p, a].iter().find(|&&c| c >= num_classes) {
            return Err(Error::ClassOutOfRange {
                class_id,
                num_classes,
            });
        }
        matrix[a][p] += 1;
    }

    Ok(ConfusionMatrix(matrix))
}
