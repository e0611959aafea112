mod as_value;
mod batch;
mod column;
mod driver;
mod executor;
mod expression;
mod metadata;
mod query;
mod row;
mod session;
mod sql_writer;
mod statement;
mod table;
mod util;
mod value;

pub use as_value::*;
pub use batch::*;
pub use column::*;
pub use driver::*;
pub use executor::*;
pub use expression::*;
pub use metadata::*;
pub use query::*;
pub use row::*;
pub use session::*;
pub use sql_writer::*;
pub use statement::*;
pub use table::*;
pub use util::*;
pub use value::*;

pub type Error = anyhow::Error;
pub type Result<T> = anyhow::Result<T>;
