//! Windfarm -- data structures for the wind farm cabling problem.
//!
//! The crate holds everything the cabling algorithms operate on:
//! - [Cabletypes](cables::Cabletypes), the piecewise-constant cable cost table,
//! - [Instance](instance::Instance), the immutable input topology,
//! - [Windfarm](graph::Windfarm), the residual graph with flow values,
//! - [Status](status::Status), the return codes shared by all algorithms.

pub mod cables;
pub mod graph;
pub mod instance;
pub mod status;

pub use cables::Cabletypes;
pub use graph::{assert_feasible_flow, assert_zero_flow, Windfarm};
pub use instance::{Instance, NodeKind};
pub use status::Status;

/// Identifier of a vertex. Vertices are numbered `0..num_vertices`,
/// with the super substation always last.
pub type VertexId = usize;

/// Identifier of an edge in the residual graph.
///
/// Edges come in four consecutive ranges: original edges `[0, m)`,
/// their reverses `[m, 2m)`, substation-to-super edges `[2m, 2m+s)`
/// and their reverses `[2m+s, 2m+2s)`.
pub type EdgeId = usize;

/// Signed amount of flow on an edge.
pub type FlowUnits = i32;

/// Cost of a cable layout or a residual move.
pub type Cost = f64;

/// Tolerance when comparing recomputed layout costs against tracked ones.
pub const COST_EPSILON: f64 = 1e-3;
