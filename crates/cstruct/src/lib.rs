//! # cstruct
//!
//! Declarative C-like record layouts over plain byte buffers.
//!
//! Declare a struct or union as an ordered list of fields (scalars, fixed arrays, nested
//! records, bit-fields and reserved padding) together with default-value and enum-label
//! directives. The resulting [RecordType] creates zero-filled [Instance]s which convert
//! to and from ordered mappings ([Instance::to_dict], [Instance::load_dict]) and render
//! as reloadable text ([Instance::pretty_dict]) or an annotated debug view
//! ([Instance::render]).
//!
//! ## Example
//!
//! ```
//! use cstruct::prelude::*;
//!
//! let flags = structure_anon(vec![bits("d0", Scalar::U8, 1), bits("d1", Scalar::U8, 2)]).unwrap();
//! let msg = structure(vec![
//!     field("a", Scalar::U16),
//!     field("", Scalar::U16),
//!     field("d", &flags),
//!     field("f", array(2, Scalar::U32)),
//!     cinit("a", 1),
//!     cinit("d1", 3),
//! ])
//! .unwrap();
//!
//! let mut inst = msg.instantiate();
//! assert_eq!(inst.get("d.d1").unwrap(), Value::U64(3));
//!
//! inst.set("f[1]", 456u32).unwrap();
//! let text = inst.pretty_dict(true);
//! let (copy, report) = msg.load_dict(&cstruct::literal::parse(&text).unwrap());
//! assert!(report.is_clean());
//! assert_eq!(copy, inst);
//! ```

pub mod bits;
pub mod builder;
pub mod dict;
pub mod directive;
pub mod errors;
pub mod field;
pub mod instance;
pub mod layout;
pub mod literal;
pub mod record;
pub mod render;
pub mod scalar;
pub mod splice;
pub mod value;

#[cfg(feature = "serde")]
pub mod serde;

pub use errors::{AccessError, LiteralError, SchemaError};
pub use instance::Instance;
pub use record::RecordType;
pub use value::{Map, Value};

/// Everything needed to declare record types and work with instances.
pub mod prelude {
    pub use crate::{
        builder::{build_type, structure, structure_anon, union, union_anon},
        dict::{LoadReport, LoadWarning, WarningKind},
        directive::{Labels, cenum, cinit},
        errors::{AccessError, SchemaError},
        field::{Decl, FieldType, array, bits, field},
        instance::Instance,
        layout::Kind,
        record::RecordType,
        scalar::Scalar,
        splice::fill_head_body,
        value::{Map, Value},
    };
}
