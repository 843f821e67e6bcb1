pub mod content;
pub mod tree;
pub mod store;
pub mod state;
pub mod config;

pub use content::*;
pub use tree::*;
pub use store::*;
pub use state::*;
pub use config::*;
