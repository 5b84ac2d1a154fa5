//! Reference namespace owned by this workflow
//!
//! Holds the `device` lookup table with its seeded pulse generator entry.

use super::{Column, ColumnType, NamespaceDescriptor, SchemaModule, TableDef, Tier};

pub const NAME: &str = "reference";

pub struct Reference;

impl SchemaModule for Reference {
    fn describe(&self) -> NamespaceDescriptor {
        NamespaceDescriptor {
            name: NAME,
            schema: "reference",
            dependencies: &[],
        }
    }

    fn tables(&self) -> &'static [TableDef] {
        TABLES
    }
}

static TABLES: &[TableDef] = &[TableDef {
    name: "device",
    tier: Tier::Lookup,
    columns: &[
        Column::key("device", ColumnType::Varchar(32)),
        Column::required("modality", ColumnType::Varchar(64)),
        Column::with_default("description", ColumnType::Varchar(256), ""),
    ],
    foreign_keys: &[],
    contents: &[&["OPTG_4", "Optogenetics", "Doric Pulse Sequence Generator"]],
}];
