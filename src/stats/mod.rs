//! Pure aggregation over the stored session list. Everything in here is
//! deterministic arithmetic, recomputed wholesale from the current list
//! whenever it changes. Nothing holds state and nothing fails on odd input.

pub mod daily;
pub mod heatmap;
pub mod monthly;
pub mod season;
