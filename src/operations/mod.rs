pub mod chart;
pub mod tracker;
