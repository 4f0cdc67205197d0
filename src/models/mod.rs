pub mod field;
pub mod field_map;
pub mod value;

pub use field::{FieldKey, FieldKind};
pub use field_map::{FieldMap, ERROR_KEY};
pub use value::FieldValue;
