pub mod interface;
pub mod selector;
