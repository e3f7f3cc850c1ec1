pub mod fields;
pub mod money;
pub mod period;
pub mod record;
pub mod rib;
pub mod schema;

pub use money::{Amount, AmountError};
pub use period::{BillingMonth, DateRange};
pub use record::{row, FieldMap, FieldValue, Row};
pub use rib::{rib_key, validate_rib, Rib, RibError, RIB_LENGTH};
pub use schema::{
    FieldDefault, FieldKind, FieldSpec, RecordKind, RecordSchema, SchemaError, SectionLayout,
    DEFAULT_LINE_WIDTH,
};
