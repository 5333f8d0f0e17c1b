//! Schema descriptors for the two record types
//!
//! Both pipelines run through the same engine; everything that differs
//! between them (table, fields, facets, plots, fit lines) lives here.

use serde::{Deserialize, Serialize};

use crate::core::error::EngineError;

/// The two dataset schemas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    /// Coarse pixel alignment readings
    Coarse,
    /// TAD converge metrology readings
    Tad,
}

impl SchemaKind {
    /// All schemas, in display order
    pub fn all() -> &'static [SchemaKind] {
        &[SchemaKind::Coarse, SchemaKind::Tad]
    }

    /// Static descriptor for this schema
    pub fn descriptor(self) -> &'static SchemaDescriptor {
        match self {
            SchemaKind::Coarse => &COARSE,
            SchemaKind::Tad => &TAD,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaKind::Coarse => "coarse",
            SchemaKind::Tad => "tad",
        }
    }
}

impl std::fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SchemaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "coarse" => Ok(SchemaKind::Coarse),
            "tad" => Ok(SchemaKind::Tad),
            _ => Err(format!("Unknown schema: {}", s)),
        }
    }
}

/// Declared storage kind of a field, applied once at load time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Integer,
    Real,
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldKind::Text => write!(f, "text"),
            FieldKind::Integer => write!(f, "integer"),
            FieldKind::Real => write!(f, "real"),
        }
    }
}

/// A named, typed column of the backing table
#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldDef {
    const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }
}

/// Synthetic fit line overlaid on a plot
#[derive(Debug, Clone, Copy)]
pub struct FitSpec {
    /// Column averaged for the slope
    pub slope: &'static str,
    /// Column averaged for the intercept
    pub intercept: &'static str,
    /// Column the line is evaluated over
    pub independent: &'static str,
    /// Plotted column the line is drawn against
    pub dependent: &'static str,
    /// Multiplier applied to the mean slope
    pub slope_factor: f64,
}

/// One scatter series derived from a view
#[derive(Debug, Clone, Copy)]
pub struct PlotSpec {
    pub title: &'static str,
    pub x: &'static str,
    pub y: &'static str,
    /// Columns whose scatter rules colour each point
    pub color_by: &'static [&'static str],
    pub fit: Option<FitSpec>,
}

/// Everything the generic engine needs to know about a schema
#[derive(Debug)]
pub struct SchemaDescriptor {
    pub kind: SchemaKind,
    pub table: &'static str,
    pub fields: &'static [FieldDef],
    pub facets: &'static [&'static str],
    pub time_key: &'static str,
    /// Default cap on rows fetched, newest first by time key
    pub row_limit: Option<usize>,
    pub plots: &'static [PlotSpec],
}

impl SchemaDescriptor {
    /// Index of a field by name
    pub fn field_index(&self, name: &str) -> Result<usize, EngineError> {
        self.fields
            .iter()
            .position(|f| f.name == name)
            .ok_or_else(|| EngineError::SchemaMismatch {
                schema: self.kind,
                name: name.to_string(),
                context: "field",
            })
    }

    /// Field index of a facet; fails for fields that are not facets
    pub fn facet_index(&self, name: &str) -> Result<usize, EngineError> {
        if !self.facets.contains(&name) {
            return Err(EngineError::SchemaMismatch {
                schema: self.kind,
                name: name.to_string(),
                context: "facet",
            });
        }
        self.field_index(name)
    }

    /// Resolve a facet name case-insensitively, ignoring spaces and underscores
    ///
    /// Lets the CLI accept `lot_name` for `Lot Name`.
    pub fn find_facet(&self, name: &str) -> Option<&'static str> {
        let wanted = normalize(name);
        self.facets.iter().copied().find(|f| normalize(f) == wanted)
    }

    pub fn field(&self, index: usize) -> &FieldDef {
        &self.fields[index]
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

// =========================================================================
// Coarse pixel
// =========================================================================

const COARSE_FIELDS: &[FieldDef] = &[
    FieldDef::new("Time", FieldKind::Text),
    FieldDef::new("X Pass/Fail", FieldKind::Text),
    FieldDef::new("Y Pass/Fail", FieldKind::Text),
    FieldDef::new("Lot Name", FieldKind::Text),
    FieldDef::new("X_Die", FieldKind::Integer),
    FieldDef::new("Y_Die", FieldKind::Integer),
    FieldDef::new("Static Iteration", FieldKind::Integer),
    FieldDef::new("Orientation", FieldKind::Text),
    FieldDef::new("Site Serial Number", FieldKind::Text),
    FieldDef::new("X", FieldKind::Real),
    FieldDef::new("Y", FieldKind::Real),
];

const COARSE_FACETS: &[&str] = &[
    "X Pass/Fail",
    "Y Pass/Fail",
    "Time",
    "Lot Name",
    "X_Die",
    "Y_Die",
    "Static Iteration",
    "Orientation",
    "Site Serial Number",
];

const COARSE_PLOTS: &[PlotSpec] = &[
    PlotSpec {
        title: "Coarse X vs. Coarse Y",
        x: "X",
        y: "Y",
        color_by: &["X", "Y"],
        fit: None,
    },
    PlotSpec {
        title: "Coarse X vs Time",
        x: "Time",
        y: "X",
        color_by: &["X"],
        fit: None,
    },
    PlotSpec {
        title: "Coarse Y vs Time",
        x: "Time",
        y: "Y",
        color_by: &["Y"],
        fit: None,
    },
];

/// Maximum coarse rows fetched per tool
pub const COARSE_ROW_LIMIT: usize = 60_000;

pub static COARSE: SchemaDescriptor = SchemaDescriptor {
    kind: SchemaKind::Coarse,
    table: "Coarse_Data",
    fields: COARSE_FIELDS,
    facets: COARSE_FACETS,
    time_key: "Time",
    row_limit: Some(COARSE_ROW_LIMIT),
    plots: COARSE_PLOTS,
};

// =========================================================================
// TAD converge
// =========================================================================

const TAD_FIELDS: &[FieldDef] = &[
    FieldDef::new("Time", FieldKind::Text),
    FieldDef::new("Recipe", FieldKind::Text),
    FieldDef::new("Lot", FieldKind::Text),
    FieldDef::new("Phase", FieldKind::Text),
    FieldDef::new("Site_Serial_Number", FieldKind::Text),
    FieldDef::new("Die_X", FieldKind::Integer),
    FieldDef::new("Die_Y", FieldKind::Integer),
    FieldDef::new("Misreg_X", FieldKind::Real),
    FieldDef::new("Misreg_Y", FieldKind::Real),
    FieldDef::new("TIS_X", FieldKind::Real),
    FieldDef::new("TIS_Y", FieldKind::Real),
    FieldDef::new("DAD_Pos_X", FieldKind::Real),
    FieldDef::new("DAD_Pos_Y", FieldKind::Real),
    FieldDef::new("Slope_X", FieldKind::Real),
    FieldDef::new("Slope_Y", FieldKind::Real),
    FieldDef::new("B_X", FieldKind::Real),
    FieldDef::new("B_Y", FieldKind::Real),
    FieldDef::new("Exit_Reason", FieldKind::Text),
    FieldDef::new("Stats", FieldKind::Text),
];

const TAD_FACETS: &[&str] = &[
    "Time",
    "Recipe",
    "Lot",
    "Phase",
    "Site_Serial_Number",
    "Die_X",
    "Die_Y",
    "Misreg_X",
    "Misreg_Y",
    "TIS_X",
    "TIS_Y",
    "DAD_Pos_X",
    "DAD_Pos_Y",
    "Slope_X",
    "Slope_Y",
    "B_X",
    "B_Y",
    "Exit_Reason",
    "Stats",
];

/// Amplification applied to the mean slope of a TAD fit line
pub const TAD_SLOPE_FACTOR: f64 = -1000.0;

const TAD_PLOTS: &[PlotSpec] = &[
    PlotSpec {
        title: "TIS X vs DAD Position X",
        x: "TIS_X",
        y: "DAD_Pos_X",
        color_by: &["DAD_Pos_X"],
        fit: Some(FitSpec {
            slope: "Slope_X",
            intercept: "B_X",
            independent: "TIS_X",
            dependent: "DAD_Pos_X",
            slope_factor: TAD_SLOPE_FACTOR,
        }),
    },
    PlotSpec {
        title: "TIS Y vs DAD Position Y",
        x: "TIS_Y",
        y: "DAD_Pos_Y",
        color_by: &["DAD_Pos_Y"],
        fit: Some(FitSpec {
            slope: "Slope_Y",
            intercept: "B_Y",
            independent: "TIS_Y",
            dependent: "DAD_Pos_Y",
            slope_factor: TAD_SLOPE_FACTOR,
        }),
    },
];

pub static TAD: SchemaDescriptor = SchemaDescriptor {
    kind: SchemaKind::Tad,
    table: "Tad_Data",
    fields: TAD_FIELDS,
    facets: TAD_FACETS,
    time_key: "Time",
    row_limit: None,
    plots: TAD_PLOTS,
};
