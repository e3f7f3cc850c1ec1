pub mod decode;
pub mod encode;
pub mod extract;
pub(crate) mod patterns;
pub mod profile;
pub mod rows;
pub mod transcode;
pub mod transform;
pub(crate) mod util;
pub mod validate;

pub use decode::decode_line;
pub use encode::{encode_line, missing_required, LineEncoder};
pub use extract::{extracted_fields, FallbackExtractor};
pub use profile::{Profile, ProfileError};
pub use rows::{read_rows, read_rows_file, RowsError};
pub use transcode::{
    file_lines, EncodeOptions, EncodedFile, FileTranscoder, LineWarning, ParsedRecord,
    PeriodFilter, NO_REFERENCE,
};
pub use transform::{TransformEngine, TransformError, TransformRule};
pub use validate::{ChecksumError, RecordValidator, RibRole, ValidationOutcome};
