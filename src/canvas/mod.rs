pub mod clock;
pub mod element;
pub mod engine;

pub use clock::*;
pub use element::*;
pub use engine::*;
