#[macro_use]
mod macros;

pub(crate) mod datastructures;
pub mod dominating_set;

pub mod elimination_order;
pub mod error;
pub mod exact;
pub mod graph;
pub mod io;
pub mod labeling;
#[cfg(feature = "pace-logging")]
pub mod logging;
pub mod nice;
pub mod pipeline;
pub mod solver;
pub mod tree_decomposition;

pub use error::Error;
pub use pipeline::Pipeline;
