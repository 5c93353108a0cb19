pub mod field_map;
pub mod source_row;
