//! Symbol table for the sema engine.
//!
//! Provides [`SymbolRegistry`], which stores records, enums, functions and
//! templates by [`TypeHash`](sema_core::TypeHash), and [`ClassGraph`], the
//! inheritance graph behind base-class queries.

mod class_graph;
mod registry;

pub use class_graph::ClassGraph;
pub use registry::SymbolRegistry;
