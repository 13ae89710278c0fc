pub mod autotab;
pub mod error;
pub mod geometry;
pub mod optimization;
pub mod search_pattern;
pub mod tab_span;
/// The `fintab_core` crate provides the geometry engine behind automatic fin tab sizing.
/// Every routine is a pure function of its inputs, so callers own all document state.
///
/// Key components:
/// - **Geometry**: `RingInterval`, `FinSpan`, `TabResult` and the ring interval merge.
/// - **Tab span**: bounding-ring selection and the tab offset/length case table.
/// - **Auto tab**: filters rings and inner tubes from a parent body and sizes the tab height.
/// - **Search patterns**: unit square and regular simplex direction sets.
/// - **Optimization**: multidirectional pattern search driven by an `OptimizationController`.
pub mod traits;

pub use geometry::{merge_intervals, FinSpan, RingInterval, TabPlacement, TabResult};
pub use tab_span::compute_tab_span;
