pub mod courier;
pub mod dish;
pub mod event;
pub mod order;
