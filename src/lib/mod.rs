//! Bot behaviour that isn't tied to a single command.

pub mod i18n;
pub mod poster;
pub mod scan;
