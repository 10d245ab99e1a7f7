pub mod boolean;
pub mod bounds;
pub mod constraints;
pub mod error;
pub mod id;
pub mod migrate;
pub mod model;
pub mod schema;
pub mod text_layout;
pub mod vector;

pub use boolean::{ResolveOptions, ResolveResult, resolve_boolean_node_path, resolve_with_options};
pub use bounds::{active_page_bounds, paint_order, world_bounds};
pub use constraints::resolve_constraints;
pub use error::{IntegrityViolation, ParseError, SerializeError};
pub use id::NodeId;
pub use model::*;
pub use schema::{ParseOutcome, SerializeOptions, parse_document_text, serialize_document};
pub use text_layout::{GlyphMeasure, TextLayout, layout_text};
pub use vector::{CornerMode, HandleSide, VectorData, VectorPoint, VectorSegment};
