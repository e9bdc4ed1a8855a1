//! Data module: field records, atlas, section and field tables

pub mod atlas;
pub mod field;
pub mod field_table;
pub mod section;

pub use crate::debug_invariants::DebugInvariants;

pub use atlas::Atlas;
pub use field::{FieldDescriptor, FieldLocation, FieldRecord, FieldType, FrameRef, StepInfo};
pub use field_table::{FieldTable, Sample};
pub use section::Section;
