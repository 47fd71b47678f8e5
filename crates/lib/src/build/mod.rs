//! Build graph construction and the stages it wires together.
//!
//! Building a unit turns its import graph into a tree of [`Target`]s: one
//! compile, assemble, archive and link step per unit as required, with shared
//! dependencies built once through the context's registry.
//!
//! # Submodules
//!
//! - [`graph`] - Graph builder, compile orchestrator and build entry points
//! - [`stages`] - The four toolchain stage targets
//! - [`store`] - Output path layout, install and cached packages
//!
//! [`Target`]: crate::target::Target

pub mod graph;
pub mod stages;
pub mod store;
mod types;

pub use graph::{build, build_all, build_command, compile};
pub use types::*;
