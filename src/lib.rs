//! Keel is a statement layer over SQL backends.
//!
//! Statements are plain values rendered by a dialect [`SqlWriter`] and run
//! through a [`Session`], over either the streaming or the blocking channel
//! of a connection. Catalog lookups are cached per connection in a
//! [`MetadataCache`] shared by every session.
//!
//! ```no_run
//! # use keel::{ColumnRef, Order, SelectQuery, Session, TableRef};
//! # async fn example<E: keel::Executor>(mut session: Session<E>) -> keel::Result<()> {
//! let active = ColumnRef::new("customer", "active");
//! let name = ColumnRef::new("customer", "name");
//! let query = SelectQuery::new(TableRef::unqualified("customer"))
//!     .field(name.clone())
//!     .filter(active.eq(true))?
//!     .order_by(name, Order::ASC)
//!     .limit(10);
//! let rows = query.fetch_all(&mut session).await?;
//! # Ok(())
//! # }
//! ```

pub use keel_core::*;
