pub mod draft;
pub mod expression;
pub mod guard;
pub mod model;

pub use draft::*;
pub use expression::*;
pub use guard::*;
pub use model::*;
