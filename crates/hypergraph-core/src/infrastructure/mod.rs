//! Infrastructure layer
//!
//! Contains the storage backends behind the hypergraph store trait.

pub mod graph;
