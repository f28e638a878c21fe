//! Column-oriented output table and the assembler that builds it from
//! per-game batches of flattened records.
use std::collections::HashSet;
use std::io::Write;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use tracing::{debug, error};

use crate::error::AssembleError;
use crate::record::{Cell, FlatRecord};

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Cell>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Cell>) -> Self {
        Self { name: name.into(), values }
    }
}

/// A table whose columns are guaranteed to share one length.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    rows: usize,
}

impl Table {
    /// Checks that every column has the same length. A mismatch means a value
    /// was dropped or duplicated upstream, so nothing is truncated or padded.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self, AssembleError> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(AssembleError::DuplicateColumn(column.name.clone()));
            }
        }

        let rows = columns.first().map_or(0, |c| c.values.len());
        if columns.iter().any(|c| c.values.len() != rows) {
            let lengths: Vec<(String, usize)> = columns
                .iter()
                .map(|c| (c.name.clone(), c.values.len()))
                .collect();
            error!(?lengths, "Column length mismatch");
            return Err(AssembleError::LengthMismatch { lengths });
        }

        Ok(Self { columns, rows })
    }

    /// One column per [`FlatRecord`] field, rows in record order.
    pub fn from_records(records: &[FlatRecord]) -> Result<Self, AssembleError> {
        let mut columns: Vec<Column> = FlatRecord::COLUMNS
            .iter()
            .map(|name| Column::new(*name, Vec::with_capacity(records.len())))
            .collect();

        for record in records {
            for (column, cell) in columns.iter_mut().zip(record.cells()) {
                column.values.push(cell);
            }
        }

        Self::from_columns(columns)
    }

    pub fn num_rows(&self) -> usize {
        self.rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        (0..self.rows).map(move |index| Row { table: self, index })
    }

    /// `{"column": [values...], ...}` in column order.
    pub fn write_json<W: Write>(&self, writer: W, pretty: bool) -> serde_json::Result<()> {
        if pretty {
            serde_json::to_writer_pretty(writer, self)
        } else {
            serde_json::to_writer(writer, self)
        }
    }

    /// One JSON object per row.
    pub fn write_ndjson<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        for row in self.rows() {
            serde_json::to_writer(&mut writer, &row)?;
            writer.write_all(b"\n")?;
        }
        Ok(())
    }
}

impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for column in &self.columns {
            map.serialize_entry(&column.name, &column.values)?;
        }
        map.end()
    }
}

/// A borrowed view of one table row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a Table,
    index: usize,
}

impl Serialize for Row<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.table.columns.len()))?;
        for column in &self.table.columns {
            map.serialize_entry(&column.name, &column.values[self.index])?;
        }
        map.end()
    }
}

/// Records flattened from a single game.
#[derive(Debug, Clone, Default)]
pub struct GameBatch {
    pub game_pk: i64,
    pub records: Vec<FlatRecord>,
}

/// Accumulates game batches in arrival order.
#[derive(Debug, Default)]
pub struct Assembler {
    records: Vec<FlatRecord>,
    games: usize,
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, batch: GameBatch) {
        debug!(game_pk = batch.game_pk, records = batch.records.len(), "Appending game batch");
        self.records.extend(batch.records);
        self.games += 1;
    }

    pub fn games(&self) -> usize {
        self.games
    }

    pub fn finish(self) -> Result<Table, AssembleError> {
        Table::from_records(&self.records)
    }
}
