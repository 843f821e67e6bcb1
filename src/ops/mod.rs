pub mod content_ops;
pub mod group_ops;
pub mod move_ops;
pub mod recovery;
pub mod tree_build;
pub mod tree_ops;
