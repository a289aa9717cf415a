pub mod features;
pub mod geometry;
pub mod graphics;
pub mod hotkeys;
pub mod layers;
pub mod mode;
pub mod popup;
pub mod query;
pub mod sources;
pub mod symbols;
