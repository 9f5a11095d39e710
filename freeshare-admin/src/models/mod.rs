//! Row types for every back-office table, each paired with the static
//! field metadata the generic table endpoints use.

mod community;
mod moderation;
mod profile;
mod item;
mod review;
mod sanction;
mod support;

pub use community::*;
pub use item::*;
pub use moderation::*;
pub use profile::*;
pub use review::*;
pub use sanction::*;
pub use support::*;
