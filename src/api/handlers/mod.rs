pub mod convert;
pub mod docs;
pub mod health;
