pub mod assignment;
pub mod roster_import;
