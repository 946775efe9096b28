pub mod postgres;
pub mod schema_gen;

pub use self::postgres::*;
pub use schema_gen::*;
