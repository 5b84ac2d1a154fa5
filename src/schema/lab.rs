//! Lab namespace: labs, users, projects, protocols and animal sources
//!
//! No upstream dependencies; activated first.

use super::{Column, ColumnType, ForeignKey, NamespaceDescriptor, SchemaModule, TableDef, Tier};

pub const NAME: &str = "lab";

pub struct Lab;

impl SchemaModule for Lab {
    fn describe(&self) -> NamespaceDescriptor {
        NamespaceDescriptor {
            name: NAME,
            schema: "lab",
            dependencies: &[],
        }
    }

    fn tables(&self) -> &'static [TableDef] {
        TABLES
    }
}

static TABLES: &[TableDef] = &[
    TableDef {
        name: "lab",
        tier: Tier::Lookup,
        columns: &[
            Column::key("lab", ColumnType::Varchar(24)),
            Column::required("lab_name", ColumnType::Varchar(255)),
            Column::with_default("institution", ColumnType::Varchar(255), ""),
            Column::with_default("address", ColumnType::Varchar(255), ""),
            Column::with_default("time_zone", ColumnType::Varchar(64), ""),
        ],
        foreign_keys: &[],
        contents: &[],
    },
    TableDef {
        name: "location",
        tier: Tier::Manual,
        columns: &[
            Column::key("lab", ColumnType::Varchar(24)),
            Column::key("location", ColumnType::Varchar(32)),
            Column::with_default("location_description", ColumnType::Varchar(255), ""),
        ],
        foreign_keys: &[ForeignKey::local("lab", &[("lab", "lab")])],
        contents: &[],
    },
    TableDef {
        name: "user_role",
        tier: Tier::Lookup,
        columns: &[Column::key("user_role", ColumnType::Varchar(16))],
        foreign_keys: &[],
        contents: &[],
    },
    TableDef {
        name: "user",
        tier: Tier::Lookup,
        columns: &[
            Column::key("user", ColumnType::Varchar(32)),
            Column::with_default("user_email", ColumnType::Varchar(128), ""),
            Column::with_default("user_cellphone", ColumnType::Varchar(32), ""),
            Column::with_default("user_fullname", ColumnType::Varchar(64), ""),
        ],
        foreign_keys: &[],
        contents: &[],
    },
    TableDef {
        name: "lab_membership",
        tier: Tier::Lookup,
        columns: &[
            Column::key("lab", ColumnType::Varchar(24)),
            Column::key("user", ColumnType::Varchar(32)),
            Column::nullable("user_role", ColumnType::Varchar(16)),
        ],
        foreign_keys: &[
            ForeignKey::local("lab", &[("lab", "lab")]),
            ForeignKey::local("user", &[("user", "user")]),
            ForeignKey::local("user_role", &[("user_role", "user_role")]),
        ],
        contents: &[],
    },
    TableDef {
        name: "protocol_type",
        tier: Tier::Lookup,
        columns: &[Column::key("protocol_type", ColumnType::Varchar(32))],
        foreign_keys: &[],
        contents: &[],
    },
    TableDef {
        name: "protocol",
        tier: Tier::Lookup,
        columns: &[
            Column::key("protocol", ColumnType::Varchar(16)),
            Column::required("protocol_type", ColumnType::Varchar(32)),
            Column::with_default("protocol_description", ColumnType::Varchar(255), ""),
        ],
        foreign_keys: &[ForeignKey::local(
            "protocol_type",
            &[("protocol_type", "protocol_type")],
        )],
        contents: &[],
    },
    TableDef {
        name: "project",
        tier: Tier::Lookup,
        columns: &[
            Column::key("project", ColumnType::Varchar(32)),
            Column::with_default("project_description", ColumnType::Varchar(1024), ""),
        ],
        foreign_keys: &[],
        contents: &[],
    },
    TableDef {
        name: "project_user",
        tier: Tier::Manual,
        columns: &[
            Column::key("project", ColumnType::Varchar(32)),
            Column::key("user", ColumnType::Varchar(32)),
        ],
        foreign_keys: &[
            ForeignKey::local("project", &[("project", "project")]),
            ForeignKey::local("user", &[("user", "user")]),
        ],
        contents: &[],
    },
    TableDef {
        name: "source",
        tier: Tier::Lookup,
        columns: &[
            Column::key("source", ColumnType::Varchar(32)),
            Column::required("source_name", ColumnType::Varchar(255)),
            Column::with_default("contact_details", ColumnType::Varchar(255), ""),
            Column::with_default("source_description", ColumnType::Varchar(255), ""),
        ],
        foreign_keys: &[],
        contents: &[],
    },
];
