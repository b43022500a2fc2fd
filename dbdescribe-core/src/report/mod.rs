//! Text layout primitives shared by the table report renderers.
//!
//! - `tabwriter`: aligned `|`-separated column table
//! - `section`: labeled list blocks suppressed when empty
//! - `quote`: double-quoted identifiers

mod quote;
mod section;
mod tabwriter;

pub use quote::quote;
pub use section::Section;
pub use tabwriter::TabWriter;
