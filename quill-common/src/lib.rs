pub mod blog;
pub mod database;
pub mod markdown_render;
pub mod memory;
pub mod page;
pub mod store;
