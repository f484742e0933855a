pub mod accounts;
pub mod catalog;
pub mod identity;
pub mod intake;
pub mod pricing;
pub mod receipt;
pub mod store;
pub mod validation;
