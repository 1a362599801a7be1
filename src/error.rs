use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("a metrics accumulator needs at least one class")]
    NoClasses,
    #[error("class id {class_id} is out of range for {num_classes} classes")]
    ClassOutOfRange { class_id: usize, num_classes: usize },
    #[error("expected {expected} labels, got {actual}")]
    LabelLengthMismatch { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
