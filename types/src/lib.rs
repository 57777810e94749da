pub mod config;
pub mod criteria;
pub mod errors;
pub mod loss;
pub mod metric;
pub mod node;

pub use config::{AnonymizationConfig, Monotonicity};
pub use criteria::Criterion;
pub use errors::{CheckerError, ConfigurationError, NumericFallbackError, PreconditionError};
pub use loss::InformationLoss;
pub use metric::{AttackerModel, Metric};
pub use node::{DictCode, Level, Transformation};
