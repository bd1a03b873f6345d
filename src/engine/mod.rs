pub mod agent;
pub mod feed;
pub mod lifecycle;
pub mod menu;
pub mod orders;
pub mod sync;
pub mod tracking;
