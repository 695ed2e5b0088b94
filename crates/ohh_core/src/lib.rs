pub mod catalog;
pub mod config;
pub mod dates;
pub mod error;
pub mod model;
pub mod notify;
pub mod reminder;
pub mod storage;
pub mod task_store;
pub mod view;
pub mod wallet;

pub use task_store::TaskStore;
