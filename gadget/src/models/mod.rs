mod constraint;
mod foreign_key;
mod function;
mod pg_type;
mod sequence;
mod table;
mod trigger;

pub use constraint::*;
pub use foreign_key::*;
pub use function::*;
pub use pg_type::*;
pub use sequence::*;
pub use table::*;
pub use trigger::*;
