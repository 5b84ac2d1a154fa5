//! Surgery namespace: brain regions and implantations
//!
//! An implantation is keyed by subject, date, implant type and target
//! region/hemisphere; the surgeon is a lab user.

use super::{Column, ColumnType, ForeignKey, NamespaceDescriptor, SchemaModule, TableDef, Tier};

pub const NAME: &str = "surgery";

pub struct Surgery;

impl SchemaModule for Surgery {
    fn describe(&self) -> NamespaceDescriptor {
        NamespaceDescriptor {
            name: NAME,
            schema: "surgery",
            dependencies: &["lab", "subject"],
        }
    }

    fn tables(&self) -> &'static [TableDef] {
        TABLES
    }
}

const IMPLANT_KEY: &[(&str, &str)] = &[
    ("subject", "subject"),
    ("implant_date", "implant_date"),
    ("implant_type", "implant_type"),
    ("target_region", "target_region"),
    ("target_hemisphere", "target_hemisphere"),
];

static TABLES: &[TableDef] = &[
    TableDef {
        name: "coordinate_reference",
        tier: Tier::Lookup,
        columns: &[Column::key("reference", ColumnType::Varchar(60))],
        foreign_keys: &[],
        contents: &[
            &["bregma"],
            &["lambda"],
            &["dura"],
            &["skull_surface"],
            &["sagittal_suture"],
            &["sinus"],
            &["skull_midline"],
        ],
    },
    TableDef {
        name: "hemisphere",
        tier: Tier::Lookup,
        columns: &[Column::key("hemisphere", ColumnType::Varchar(32))],
        foreign_keys: &[],
        contents: &[&["left"], &["right"], &["middle"]],
    },
    TableDef {
        name: "brain_region",
        tier: Tier::Lookup,
        columns: &[
            Column::key("region_acronym", ColumnType::Varchar(32)),
            Column::required("region_name", ColumnType::Varchar(128)),
        ],
        foreign_keys: &[],
        contents: &[],
    },
    TableDef {
        name: "implantation_type",
        tier: Tier::Lookup,
        columns: &[
            Column::key("implant_type", ColumnType::Varchar(16)),
            Column::with_default("implant_type_description", ColumnType::Varchar(1024), ""),
        ],
        foreign_keys: &[],
        contents: &[
            &["ecephys", "Electrophysiology probe"],
            &["fiber", "Fiber photometry implant"],
            &["lens", "Imaging lens"],
            &["opto", "Optogenetics fiber"],
        ],
    },
    TableDef {
        name: "implantation",
        tier: Tier::Manual,
        columns: &[
            Column::key("subject", ColumnType::Varchar(8)),
            Column::key("implant_date", ColumnType::Datetime),
            Column::key("implant_type", ColumnType::Varchar(16)),
            Column::key("target_region", ColumnType::Varchar(32)),
            Column::key("target_hemisphere", ColumnType::Varchar(32)),
            Column::required("surgeon", ColumnType::Varchar(32)),
            Column::with_default("implant_comment", ColumnType::Varchar(1024), ""),
        ],
        foreign_keys: &[
            ForeignKey::linked("Subject", &[("subject", "subject")]),
            ForeignKey::local("implantation_type", &[("implant_type", "implant_type")]),
            ForeignKey::local("brain_region", &[("target_region", "region_acronym")]),
            ForeignKey::local("hemisphere", &[("target_hemisphere", "hemisphere")]),
            ForeignKey::linked("User", &[("surgeon", "user")]),
        ],
        contents: &[],
    },
    TableDef {
        name: "implantation__coordinate",
        tier: Tier::Part,
        columns: &[
            Column::key("subject", ColumnType::Varchar(8)),
            Column::key("implant_date", ColumnType::Datetime),
            Column::key("implant_type", ColumnType::Varchar(16)),
            Column::key("target_region", ColumnType::Varchar(32)),
            Column::key("target_hemisphere", ColumnType::Varchar(32)),
            Column::required("ap", ColumnType::Decimal(6, 3)),
            Column::required("ap_ref", ColumnType::Varchar(60)),
            Column::required("ml", ColumnType::Decimal(6, 3)),
            Column::required("ml_ref", ColumnType::Varchar(60)),
            Column::required("dv", ColumnType::Decimal(6, 3)),
            Column::required("dv_ref", ColumnType::Varchar(60)),
            Column::nullable("theta", ColumnType::Decimal(5, 2)),
            Column::nullable("phi", ColumnType::Decimal(5, 2)),
            Column::nullable("beta", ColumnType::Decimal(5, 2)),
        ],
        foreign_keys: &[
            ForeignKey::local("implantation", IMPLANT_KEY),
            ForeignKey::local("coordinate_reference", &[("ap_ref", "reference")]),
            ForeignKey::local("coordinate_reference", &[("ml_ref", "reference")]),
            ForeignKey::local("coordinate_reference", &[("dv_ref", "reference")]),
        ],
        contents: &[],
    },
];
