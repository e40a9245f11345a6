//! Intermediate binding table of a running query
//!
//! A `Relation` is a multiset of rows over a growing, ordered set of variable
//! names. Each row is a byte buffer holding one 16-byte `EntityKey` per
//! column; a column past the end of a row, or an all-zero key, is unbound.
//!
//! Every (variable, value) pair is indexed in a roaring bitmap of the row
//! numbers that carry it, which drives both duplicate suppression on insert
//! and the bitmap-intersection join. Bitmap slots are `u32`, so a relation
//! holds at most [`MAX_ROWS`] rows; growing past its limit is an error.

use std::collections::{BTreeSet, HashMap, HashSet};

use roaring::RoaringBitmap;

use crate::core::{EntityKey, KEY_SIZE};
use crate::error::{HodError, Result};

/// Largest row count a relation can index.
pub const MAX_ROWS: usize = u32::MAX as usize;

/// Set of keys in ascending order
pub type EntitySet = BTreeSet<EntityKey>;

/// One tuple of bindings
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Row {
    content: Vec<u8>,
}

impl Row {
    pub fn value_at(&self, pos: usize) -> EntityKey {
        let start = pos * KEY_SIZE;
        self.content.get(start..start + KEY_SIZE).and_then(EntityKey::from_bytes).unwrap_or_default()
    }

    /// Writes `key` at column `pos`, growing the buffer; empty keys are ignored.
    pub fn set_value(&mut self, pos: usize, key: EntityKey) {
        if key.is_empty() {
            return;
        }
        let end = (pos + 1) * KEY_SIZE;
        if self.content.len() < end {
            self.content.resize(end, 0);
        }
        self.content[pos * KEY_SIZE..end].copy_from_slice(&key.to_bytes());
    }

    fn copy_from(&mut self, other: &Row) {
        self.content.clear();
        self.content.extend_from_slice(&other.content);
    }

    fn width(&self) -> usize {
        self.content.len() / KEY_SIZE
    }
}

/// Recycles row buffers between joins.
#[derive(Debug, Default)]
struct RowPool {
    free: Vec<Row>,
}

impl RowPool {
    fn acquire(&mut self) -> Row {
        match self.free.pop() {
            Some(mut row) => {
                row.content.clear();
                row
            }
            None => Row::default(),
        }
    }

    fn release(&mut self, row: Row) {
        self.free.push(row);
    }
}

#[derive(Debug, Default)]
pub struct Relation {
    rows: Vec<Row>,
    columns: Vec<String>,
    vars: HashMap<String, usize>,
    multiindex: HashMap<String, HashMap<EntityKey, RoaringBitmap>>,
    pool: RowPool,
    row_limit: Option<usize>,
}

impl Relation {
    pub fn new<S: AsRef<str>>(vars: &[S]) -> Self {
        let mut rel = Relation::default();
        for var in vars {
            rel.ensure_column(var.as_ref());
        }
        rel
    }

    /// Relation that refuses to grow past `limit` rows (capped at [`MAX_ROWS`]).
    pub fn with_row_limit<S: AsRef<str>>(vars: &[S], limit: usize) -> Self {
        let mut rel = Relation::new(vars);
        rel.row_limit = Some(limit.min(MAX_ROWS));
        rel
    }

    pub fn row_limit(&self) -> usize {
        self.row_limit.unwrap_or(MAX_ROWS)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn position(&self, var: &str) -> Option<usize> {
        self.vars.get(var).copied()
    }

    fn ensure_column(&mut self, var: &str) -> usize {
        if let Some(pos) = self.vars.get(var) {
            return *pos;
        }
        let pos = self.columns.len();
        self.columns.push(var.to_string());
        self.vars.insert(var.to_string(), pos);
        pos
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Value of `var` in row `idx`; empty when unbound.
    pub fn value(&self, idx: usize, var: &str) -> EntityKey {
        match (self.rows.get(idx), self.position(var)) {
            (Some(row), Some(pos)) => row.value_at(pos),
            _ => EntityKey::empty(),
        }
    }

    pub fn has_values_for(&self, var: &str) -> bool {
        self.multiindex.get(var).map_or(false, |m| !m.is_empty())
    }

    pub fn values_for(&self, var: &str) -> EntitySet {
        self.multiindex.get(var).map(|m| m.keys().copied().collect()).unwrap_or_default()
    }

    /// Adds a row with no bound columns.
    pub fn add_unit_row(&mut self) {
        let row = self.pool.acquire();
        self.rows.push(row);
    }

    pub fn add_one_value<I: IntoIterator<Item = EntityKey>>(&mut self, var: &str, values: I) -> Result<()> {
        for value in values {
            self.add_values(&[var], &[value])?;
        }
        Ok(())
    }

    pub fn add_two_values<I>(&mut self, var1: &str, var2: &str, values: I) -> Result<()>
    where
        I: IntoIterator<Item = (EntityKey, EntityKey)>,
    {
        for (a, b) in values {
            self.add_values(&[var1, var2], &[a, b])?;
        }
        Ok(())
    }

    pub fn add_three_values<I>(&mut self, var1: &str, var2: &str, var3: &str, values: I) -> Result<()>
    where
        I: IntoIterator<Item = (EntityKey, EntityKey, EntityKey)>,
    {
        for (a, b, c) in values {
            self.add_values(&[var1, var2, var3], &[a, b, c])?;
        }
        Ok(())
    }

    /// Appends one tuple unless a row already carries all of its values.
    ///
    /// A variable named twice must receive the same value in both places.
    fn add_values(&mut self, vars: &[&str], values: &[EntityKey]) -> Result<()> {
        if values.iter().any(EntityKey::is_empty) {
            return Ok(());
        }
        for i in 0..vars.len() {
            for j in i + 1..vars.len() {
                if vars[i] == vars[j] && values[i] != values[j] {
                    return Ok(());
                }
            }
        }
        if self.contains_tuple(vars, values) {
            return Ok(());
        }
        if self.rows.len() >= self.row_limit() {
            return Err(HodError::RowLimit(self.row_limit()));
        }
        let positions: Vec<usize> = vars.iter().map(|v| self.ensure_column(v)).collect();
        let mut row = self.pool.acquire();
        for (pos, value) in positions.iter().zip(values) {
            row.set_value(*pos, *value);
        }
        self.rows.push(row);
        self.index_row(self.rows.len() - 1)
    }

    fn contains_tuple(&self, vars: &[&str], values: &[EntityKey]) -> bool {
        let mut found: Option<RoaringBitmap> = None;
        for (var, value) in vars.iter().zip(values) {
            let Some(bitmap) = self.multiindex.get(*var).and_then(|m| m.get(value)) else {
                return false;
            };
            found = Some(match found {
                None => bitmap.clone(),
                Some(mut acc) => {
                    acc &= bitmap;
                    acc
                }
            });
        }
        found.map_or(false, |bm| !bm.is_empty())
    }

    fn index_row(&mut self, idx: usize) -> Result<()> {
        let slot = u32::try_from(idx).map_err(|_| HodError::RowLimit(MAX_ROWS))?;
        let row = &self.rows[idx];
        for (var, pos) in &self.vars {
            let value = row.value_at(*pos);
            if value.is_empty() {
                continue;
            }
            self.multiindex.entry(var.clone()).or_default().entry(value).or_default().insert(slot);
        }
        Ok(())
    }

    fn rebuild_index(&mut self) -> Result<()> {
        self.multiindex.clear();
        for idx in 0..self.rows.len() {
            self.index_row(idx)?;
        }
        Ok(())
    }

    /// Rows of `other` whose `on` columns equal those of `row`, or `None`.
    fn matching_rows(&self, row: &Row, other: &Relation, on: &[String]) -> Option<RoaringBitmap> {
        let mut acc: Option<RoaringBitmap> = None;
        for var in on {
            let value = row.value_at(self.position(var)?);
            let bitmap = other.multiindex.get(var)?.get(&value)?;
            acc = Some(match acc {
                None => bitmap.clone(),
                Some(mut a) => {
                    a &= bitmap;
                    a
                }
            });
        }
        acc.filter(|bm| !bm.is_empty())
    }

    /// Inner join with `other` on the shared variables `on`.
    ///
    /// Columns of `other` missing here are appended. With an empty `on` every
    /// row is paired with every row of `other`. Rows that find no partner are
    /// dropped. A result larger than the row limit empties the relation and
    /// fails with [`HodError::RowLimit`].
    pub fn join(&mut self, other: &Relation, on: &[String]) -> Result<()> {
        let targets: Vec<(usize, usize)> =
            other.columns.iter().enumerate().map(|(opos, name)| (opos, self.ensure_column(name))).collect();

        let limit = self.row_limit();
        let old_rows = std::mem::take(&mut self.rows);
        let mut joined = Vec::new();
        let mut overflow = false;
        for row in &old_rows {
            let matches: Vec<usize> = if on.is_empty() {
                (0..other.rows.len()).collect()
            } else {
                match self.matching_rows(row, other, on) {
                    Some(bitmap) => bitmap.iter().map(|slot| slot as usize).collect(),
                    None => continue,
                }
            };
            if joined.len() + matches.len() > limit {
                overflow = true;
                break;
            }
            for idx in matches {
                let other_row = &other.rows[idx];
                let mut new_row = self.pool.acquire();
                new_row.copy_from(row);
                for &(opos, spos) in &targets {
                    new_row.set_value(spos, other_row.value_at(opos));
                }
                joined.push(new_row);
            }
        }
        for row in old_rows {
            self.pool.release(row);
        }
        self.rows = joined;
        if overflow {
            self.clear();
            return Err(HodError::RowLimit(limit));
        }
        self.rebuild_index()
    }

    /// Drops every row and takes over the rows of `other`, remapped onto
    /// this relation's columns.
    pub fn replace_with(&mut self, other: &Relation) -> Result<()> {
        self.clear();
        self.add_unit_row();
        self.join(other, &[])
    }

    pub fn clear(&mut self) {
        for row in self.rows.drain(..) {
            self.pool.release(row);
        }
        self.multiindex.clear();
    }

    /// Distinct tuples of `vars`, skipping rows where any of them is unbound.
    pub fn project(&self, vars: &[String]) -> Vec<Vec<EntityKey>> {
        let positions: Vec<Option<usize>> = vars.iter().map(|v| self.position(v)).collect();
        let mut seen: HashSet<Vec<EntityKey>> = HashSet::new();
        let mut out = Vec::new();
        'rows: for row in &self.rows {
            let mut tuple = Vec::with_capacity(positions.len());
            for pos in &positions {
                let value = pos.map(|p| row.value_at(p)).unwrap_or_default();
                if value.is_empty() {
                    continue 'rows;
                }
                tuple.push(value);
            }
            if seen.insert(tuple.clone()) {
                out.push(tuple);
            }
        }
        out
    }

    /// Widest row, in columns.
    pub fn max_row_width(&self) -> usize {
        self.rows.iter().map(Row::width).max().unwrap_or(0)
    }
}
