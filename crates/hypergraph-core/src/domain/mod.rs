//! Domain layer
//!
//! Contains the hypergraph model and the engines that operate on it.

pub mod graph;
