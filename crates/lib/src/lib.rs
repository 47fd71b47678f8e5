//! grist-lib: incremental build execution core
//!
//! Turns a compilation unit and its import graph into a graph of memoized build
//! steps (compile, assemble, archive, link) and runs them concurrently:
//! - `Target`: one-shot, memoized build step shared by all of its dependents
//! - `Registry`: single-creation map from `(scope, import path)` to target
//! - `build`: graph builder, compile orchestrator and entry points
//! - `Toolchain`: the external compiler/assembler/archiver/linker boundary
//! - `FingerprintCache`: staleness oracle backed by install markers
//! - `Workspace`: `grist.json` manifest and the resolver it provides

pub mod build;
pub mod cache;
pub mod consts;
pub mod context;
pub mod manifest;
pub mod plan;
pub mod registry;
pub mod target;
pub mod toolchain;
pub mod unit;
pub mod util;
