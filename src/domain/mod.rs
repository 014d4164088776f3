pub mod ai;
pub mod bomb;
pub mod entity;
pub mod grid;
pub mod tile;
