use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Column roles: which recognised column names get which cleaning rule
// ---------------------------------------------------------------------------

/// Text written in place of a value that is missing or could not be parsed.
pub const SENTINEL: &str = "No especificado";

/// Income column; the only one whose values are range-checked and coerced.
pub const INCOME_COLUMN: &str = "Ingresos (Salarios Mínimos)";

pub const DATE_COLUMNS: [&str; 2] = ["Fecha de Nacimiento", "Fecha de Registro"];

pub const NUMERIC_COLUMNS: [&str; 3] = [INCOME_COLUMN, "Edad", "Número de Hijos"];

pub const CATEGORICAL_COLUMNS: [&str; 7] = [
    "Profesión",
    "Estado Civil",
    "Barrio",
    "Correo",
    "Tiene Mascotas",
    "Cliente Nuevo",
    "Historial de Compras",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnRole {
    Date,
    Numeric,
    Categorical,
}

/// Name-keyed classification driving the cleaner. Columns are matched by
/// exact name; names absent from a table are skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    pub date_columns: Vec<String>,
    pub numeric_columns: Vec<String>,
    pub categorical_columns: Vec<String>,
    /// Numeric column whose negative or non-numeric values become missing.
    pub income_column: Option<String>,
    pub sentinel: String,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        fn owned(names: &[&str]) -> Vec<String> {
            names.iter().map(|s| s.to_string()).collect()
        }
        Self {
            date_columns: owned(&DATE_COLUMNS),
            numeric_columns: owned(&NUMERIC_COLUMNS),
            categorical_columns: owned(&CATEGORICAL_COLUMNS),
            income_column: Some(INCOME_COLUMN.to_string()),
            sentinel: SENTINEL.to_string(),
        }
    }
}

impl CleaningConfig {
    /// Parse a configuration from JSON; omitted fields take the defaults.
    pub fn from_json_str(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Every role a column name is registered under, in cleaning order.
    pub fn roles_of(&self, column: &str) -> Vec<ColumnRole> {
        let mut roles = Vec::new();
        if self.date_columns.iter().any(|c| c == column) {
            roles.push(ColumnRole::Date);
        }
        if self.categorical_columns.iter().any(|c| c == column) {
            roles.push(ColumnRole::Categorical);
        }
        if self.numeric_columns.iter().any(|c| c == column) {
            roles.push(ColumnRole::Numeric);
        }
        roles
    }

    /// Names registered under more than one role. With such overlap the
    /// categorical fill runs first and the numeric fill never sees a missing
    /// value, so callers may want to warn about it.
    pub fn overlapping_columns(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .date_columns
            .iter()
            .chain(&self.numeric_columns)
            .chain(&self.categorical_columns)
            .map(String::as_str)
            .filter(|name| self.roles_of(name).len() > 1)
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}
