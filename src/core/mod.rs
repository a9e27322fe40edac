// Core modules implementing schema, value, marshaling, and error modeling.
pub mod codec;
pub mod error;
pub mod marshal;
pub mod schema;
pub mod value;
