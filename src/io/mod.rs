pub mod project_io;
pub mod store_io;
