mod error;
mod repository;
mod stores;
mod tables;
mod utils;

pub use error::*;
pub use repository::*;
pub use stores::*;
pub use tables::*;
pub use utils::*;
