use crate::error::{Error, Result};

/// Converts a class id into a one-hot vector of length `num_classes`.
pub fn to_one_hot(class_id: usize, num_classes: usize) -> Result<Box<[f64]>> {
    if class_id >= num_classes {
        return Err(Error::ClassOutOfRange {
            class_id,
            num_classes,
        });
    }

    let mut encoded = vec![0.0; num_classes].into_boxed_slice();
    encoded[class_id] = 1.0;
    Ok(encoded)
}
