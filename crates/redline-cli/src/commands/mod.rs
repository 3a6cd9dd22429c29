//! Command implementations.

pub mod compare;
pub mod validate;

pub use self::compare::execute_compare;
pub use self::validate::execute_validate;
