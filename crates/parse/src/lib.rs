pub mod builder;
pub mod error;
pub mod normalize;
pub mod template;

pub use builder::PurchaseBuilder;
pub use error::PurchaseError;
pub use template::{Field, Template, TemplateError, TemplateMatch, TemplateSet, TemplateSpec};
