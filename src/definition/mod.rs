pub mod approver;
pub mod connect;
pub mod hydrate;
pub mod model;
pub mod repair;
pub mod signature;
pub mod steps;

pub use approver::*;
pub use connect::*;
pub use hydrate::*;
pub use model::*;
pub use repair::*;
pub use signature::*;
pub use steps::*;
