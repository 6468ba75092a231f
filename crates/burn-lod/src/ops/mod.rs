
mod attribute;
mod base;
mod desc;
mod registry;
mod schema;
mod scope;
mod sequence_concat;

pub use attribute::*;
pub use base::*;
pub use desc::*;
pub use registry::*;
pub use schema::*;
pub use scope::*;
pub use sequence_concat::*;
