pub mod index;
pub mod put;
pub mod get;

pub use index::index_handler;
pub use put::put_handler;
pub use get::get_handler;
