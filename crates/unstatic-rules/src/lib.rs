//! unstatic-rules: Detection rules and their fixes
//!
//! Available rules:
//! - unstatic_class: Report `static` classes and make them non-static

pub mod diagnostic;
pub mod fix;
pub mod registry;
pub mod unstatic_class;

pub use diagnostic::{Diagnostic, Severity};
pub use fix::{fix_all, CodeFix, FixAllResult};
pub use registry::{RegistryError, Rule, RuleRegistry};
pub use unstatic_class::UnstaticClassRule;
