pub mod confusion;
pub mod error;
pub mod metrics;
pub mod one_hot;

pub use confusion::{confusion_matrix, ConfusionMatrix};
pub use error::{Error, Result};
pub use metrics::{f_measure, MacroMetrics, MetricsAccumulator, MicroMetrics};
pub use one_hot::to_one_hot;
