//! Result row mapping
//!
//! Turns untyped engine rows into labeled tuples, projections, ordered maps
//! or serde-decoded entities.

mod decode;
mod errors;
mod fields;
mod projection;
mod rows;
mod tuple;
mod value;

pub use decode::{ContentType, FromRowValue, LenientDecode};
pub use errors::{MapperError, MapperErrorCode, MapperResult};
pub use fields::{strip_at, with_at, ReturnFieldSet};
pub use projection::{property_for_getter, Json, Projection, PropertyBag};
pub use rows::{decode_entity, to_entities, to_maps, to_projections, to_tuples, RowMap, ID_KEYS};
pub use tuple::{Tuple, MAX_TUPLE_ARITY};
pub use value::{ResultRow, RowValue};
