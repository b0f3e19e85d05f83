pub mod diary_store;

pub use diary_store::*;
