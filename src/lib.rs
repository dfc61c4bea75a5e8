//! # shinsa
//!
//! Core engine of a graph-based approval workflow designer.
//!
//! The crate owns everything that is not rendering: the serializable
//! `graph_v1` process definition, the structured condition model with its
//! expression synthesis, the interactive canvas state engine with debounced
//! change emission, the bounded undo/redo history, and the layout and
//! validation algorithms.
//!
//! ## Quick start
//!
//! ```
//! use shinsa::prelude::*;
//! use shinsa::canvas::SystemClock;
//!
//! let mut engine = CanvasEngine::new(default_definition(), Box::new(SystemClock));
//! let approver = engine.append_node_after("approval_1", NodeType::Approval)?;
//! engine.rename_node(&approver, "Second review")?;
//!
//! let definition = engine.build_definition();
//! let report = validate_definition(&definition);
//! assert!(report.valid);
//! # Ok::<(), shinsa::CanvasError>(())
//! ```

pub mod canvas;
pub mod condition;
pub mod definition;
pub mod error;
pub mod history;
pub mod layout;
pub mod prelude;
pub mod validate;

pub use error::{CanvasError, ConnectError, ExpressionError};
