//! Format-independent model for Larian resource files.
//!
//! Every resource container (the columnar **LSF** layout as well as the older flat variants)
//! decodes to the same shape: a [`Resource`] holding engine [`Metadata`] and a forest of named
//! [`Node`]s, each carrying an ordered list of typed [`NodeAttribute`]s.
//!
//! ## Attribute types
//!
//! Attribute values are tagged with a [`DataType`], whose discriminant is the 6-bit id stored on
//! disk. The payload is a closed [`AttributeValue`] union:
//!
//! | Ids      | Types                                   | Payload                          |
//! |----------|-----------------------------------------|----------------------------------|
//! | 1-7      | `uint8` … `double`                      | native scalar                    |
//! | 8-13     | `ivec2` … `fvec4`                       | `Vec<i32>` / `Vec<f32>`          |
//! | 14-18    | `mat2x2` … `mat4x4`                     | row-major [`Matrix`]             |
//! | 19       | `bool`                                  | `bool`                           |
//! | 20-23    | `string`, `path`, `FixedString`, …      | `String`                         |
//! | 24-27    | `uint64`, `ScratchBuffer`, `old_int64`, `int8` | native scalar / bytes     |
//! | 28, 33   | `TranslatedString`, `TranslatedFSString` | localized string structs        |
//! | 29-30    | `WString`, `LSWString`                  | `String`                         |
//! | 31       | `guid`                                  | [`uuid::Uuid`]                   |
//! | 32       | `int64`                                 | `i64`                            |
//!
//! Every value has a textual form ([`AttributeValue::render`]) that parses back with
//! [`AttributeValue::parse`].

pub mod error;
pub mod resource;
pub mod types;
pub mod value;

pub use resource::{Metadata, Node, NodeAttribute, NodeId, Resource};
pub use types::DataType;
pub use value::{
    AttributeValue, Matrix, TranslatedFsString, TranslatedFsStringArgument, TranslatedString,
};
