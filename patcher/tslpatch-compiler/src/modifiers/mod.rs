//! Modifier model, one module per resource family

pub mod gff;
pub mod ssf;
pub mod tlk;
pub mod twoda;

pub use gff::{FieldEdit, FieldInsert, FieldTreeModifier, ListInsert, NestedInsert};
pub use ssf::SoundEdit;
pub use tlk::StringAppend;
pub use twoda::{AddColumn, AddRow, ChangeRow, CopyRow, RowTableModifier, RowTarget};
