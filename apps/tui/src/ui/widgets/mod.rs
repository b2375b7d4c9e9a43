pub mod badges;
pub mod charts;
pub mod popup;
pub mod tables;
