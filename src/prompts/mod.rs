pub mod select;
pub mod vision;
