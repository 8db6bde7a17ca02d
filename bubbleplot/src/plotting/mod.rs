pub mod chart;
pub mod colormap;
pub mod export;
