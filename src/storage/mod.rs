pub mod json_store;
pub mod snapshot;

pub use json_store::{JsonFileStore, MatchStore};
pub use snapshot::save_snapshot;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;

/// Serializes with the 4-space indentation the store file has always used.
pub(crate) fn to_pretty_json<T: Serialize + ?Sized>(
    value: &T,
) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    Ok(buf)
}
