use serde::Serialize;

/// VOTable FIELD datatypes, collapsed to what a cell can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Boolean,
    Integer,
    Float,
    Text,
}

impl DataType {
    pub fn from_votable(datatype: &str) -> Self {
        match datatype {
            "boolean" => DataType::Boolean,
            "bit" | "unsignedByte" | "short" | "int" | "long" => DataType::Integer,
            "float" | "double" => DataType::Float,
            _ => DataType::Text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub datatype: DataType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ucd: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<String>, datatype: DataType) -> Self {
        Self {
            name: name.into(),
            datatype,
            unit: None,
            ucd: None,
        }
    }
}

/// A single cell. `Null` is a masked cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn is_masked(&self) -> bool {
        matches!(self, Value::Null)
    }

    fn widen_to(self, datatype: DataType) -> Value {
        match (self, datatype) {
            (Value::Null, _) => Value::Null,
            (Value::Int(i), DataType::Float) => Value::Float(i as f64),
            (Value::Text(s), DataType::Text) => Value::Text(s),
            (other, DataType::Text) => Value::Text(other.to_string()),
            (other, _) => other,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => f.write_str(s),
        }
    }
}

/// Provenance of a table: one entry per sub-query that contributed to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableMeta {
    pub url: Vec<String>,
    pub xml_raw: Vec<String>,
}

impl TableMeta {
    pub fn single(url: impl Into<String>, xml_raw: impl Into<String>) -> Self {
        Self {
            url: vec![url.into()],
            xml_raw: vec![xml_raw.into()],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Value>>,
    pub meta: TableMeta,
}

impl Table {
    pub fn new(columns: Vec<Column>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns,
            rows,
            meta: TableMeta::default(),
        }
    }

    /// Zero columns, zero rows, provenance only.
    pub fn empty(meta: TableMeta) -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            meta,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Cells of one column, top to bottom.
    pub fn column_values(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Row-stacks tables in order with an outer join on column names.
    ///
    /// Columns keep the order of first appearance; a repeated name is
    /// matched by occurrence, so the second `mag` of one table lines up
    /// with the second `mag` of the next. A row from a table that lacks a
    /// column gets a masked cell there, and cells of a widened column are
    /// converted to the wider type. Metadata lists are concatenated, so
    /// every contributing table keeps its provenance entries even when it
    /// has no rows.
    pub fn vstack(tables: Vec<Table>) -> Table {
        let mut columns: Vec<Column> = Vec::new();
        let mut keys: Vec<(String, usize)> = Vec::new();
        for table in &tables {
            for (column, key) in table.columns.iter().zip(column_keys(&table.columns)) {
                match keys.iter().position(|k| *k == key) {
                    Some(idx) => {
                        columns[idx].datatype = merge_datatype(columns[idx].datatype, column.datatype);
                    }
                    None => {
                        keys.push(key);
                        columns.push(column.clone());
                    }
                }
            }
        }

        let mut stacked = Table::new(columns, Vec::new());
        for table in tables {
            let source_keys = column_keys(&table.columns);
            let mapping: Vec<Option<usize>> = keys
                .iter()
                .map(|key| source_keys.iter().position(|k| k == key))
                .collect();

            for row in table.rows {
                let merged: Vec<Value> = mapping
                    .iter()
                    .zip(&stacked.columns)
                    .map(|(source, column)| match source.and_then(|idx| row.get(idx)) {
                        Some(value) => value.clone().widen_to(column.datatype),
                        None => Value::Null,
                    })
                    .collect();
                stacked.rows.push(merged);
            }

            stacked.meta.url.extend(table.meta.url);
            stacked.meta.xml_raw.extend(table.meta.xml_raw);
        }

        stacked
    }
}

/// `(name, n)` for the n-th column carrying that name.
fn column_keys(columns: &[Column]) -> Vec<(String, usize)> {
    let mut keys: Vec<(String, usize)> = Vec::with_capacity(columns.len());
    for column in columns {
        let seen = keys.iter().filter(|(name, _)| *name == column.name).count();
        keys.push((column.name.clone(), seen));
    }
    keys
}

fn merge_datatype(a: DataType, b: DataType) -> DataType {
    match (a, b) {
        (a, b) if a == b => a,
        (DataType::Integer, DataType::Float) | (DataType::Float, DataType::Integer) => DataType::Float,
        _ => DataType::Text,
    }
}
