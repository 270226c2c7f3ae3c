//! Type mappers.
//!
//! A type mapper establishes a bit-exact correspondence between two
//! structurally different types. It is a sparse matrix over the flat
//! views of both types: entry `(i, j) = k > 0` maps flat field `i` of
//! type A onto flat field `j` of type B, with `k` giving the
//! concatenation slot when several fields share a counterpart.
//!
//! For emission, the nonzero cells are grouped into *mapping pairs*:
//! the fields on either side that belong together, ordered by their
//! concatenation ordinals, from which the back-end computes slice
//! offsets.

use crate::cat;
use crate::database::{Database, NodeId, TypeId};
use crate::error::{Error, Result};
use crate::flat::{flatten, FlatType};
use crate::traits::Identify;

/// A dense matrix of mapping ordinals.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingMatrix {
    height: usize,
    width: usize,
    elements: Vec<usize>,
}

impl MappingMatrix {
    /// Construct a zeroed matrix.
    pub fn new(height: usize, width: usize) -> MappingMatrix {
        MappingMatrix {
            height,
            width,
            elements: vec![0; height * width],
        }
    }

    /// Construct an identity matrix.
    pub fn identity(dim: usize) -> MappingMatrix {
        let mut result = MappingMatrix::new(dim, dim);
        for i in 0..dim {
            result.elements[dim * i + i] = 1;
        }
        result
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Return the ordinal at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> Result<usize> {
        if row >= self.height || col >= self.width {
            return Err(Error::IndexError(format!(
                "({}, {}) exceeds matrix dimensions ({}, {})",
                row, col, self.height, self.width
            )));
        }
        Ok(self.elements[self.width * row + col])
    }

    /// Set the ordinal at `(row, col)`.
    pub fn set(&mut self, row: usize, col: usize, value: usize) -> Result<()> {
        if row >= self.height || col >= self.width {
            return Err(Error::IndexError(format!(
                "({}, {}) exceeds matrix dimensions ({}, {})",
                row, col, self.height, self.width
            )));
        }
        self.elements[self.width * row + col] = value;
        Ok(())
    }

    /// Return the largest ordinal in a row.
    pub fn max_of_row(&self, row: usize) -> Result<usize> {
        (0..self.width)
            .map(|col| self.get(row, col))
            .try_fold(0, |max, v| v.map(|v| max.max(v)))
    }

    /// Return the largest ordinal in a column.
    pub fn max_of_column(&self, col: usize) -> Result<usize> {
        (0..self.height)
            .map(|row| self.get(row, col))
            .try_fold(0, |max, v| v.map(|v| max.max(v)))
    }

    /// Assign the next free ordinal of the group containing `(row, col)`.
    pub fn set_next(&mut self, row: usize, col: usize) -> Result<()> {
        let next = self.max_of_row(row)?.max(self.max_of_column(col)?) + 1;
        self.set(row, col, next)
    }

    /// Unchecked read for internal loops over known-good indices.
    pub(crate) fn value(&self, row: usize, col: usize) -> usize {
        self.elements[self.width * row + col]
    }

    /// Return the transposed matrix.
    pub fn transpose(&self) -> MappingMatrix {
        let mut result = MappingMatrix::new(self.width, self.height);
        for row in 0..self.height {
            for col in 0..self.width {
                result.elements[self.height * col + row] = self.elements[self.width * row + col];
            }
        }
        result
    }
}

/// One entry of a mapping pair: a flat index and its flat type.
#[derive(Debug, Clone)]
pub struct PairEntry {
    /// Index into the flat view the entry came from.
    pub index: usize,
    /// The flat type at that index.
    pub flat: FlatType,
}

/// A group of flat fields on either side that map onto each other.
#[derive(Debug, Clone)]
pub struct MappingPair {
    a: Vec<PairEntry>,
    b: Vec<PairEntry>,
}

impl MappingPair {
    /// Number of A-side entries.
    pub fn num_a(&self) -> usize {
        self.a.len()
    }

    /// Number of B-side entries.
    pub fn num_b(&self) -> usize {
        self.b.len()
    }

    /// A-side entry `i`, in concatenation order.
    pub fn flat_a(&self, i: usize) -> &FlatType {
        &self.a[i].flat
    }

    /// B-side entry `i`, in concatenation order.
    pub fn flat_b(&self, i: usize) -> &FlatType {
        &self.b[i].flat
    }

    /// Flat index of A-side entry `i`.
    pub fn index_a(&self, i: usize) -> usize {
        self.a[i].index
    }

    /// Flat index of B-side entry `i`.
    pub fn index_b(&self, i: usize) -> usize {
        self.b[i].index
    }

    /// Smallest A-side flat index, used to order pairs.
    pub fn min_index_a(&self) -> usize {
        self.a.iter().map(|e| e.index).min().unwrap_or(0)
    }

    /// Total width of the A side as a node expression, substituting
    /// `default` for entries without a defined width.
    pub fn width_a(&self, db: &mut Database, default: NodeId) -> NodeId {
        Self::width_of(&self.a, db, default)
    }

    /// Total width of the B side as a node expression, substituting
    /// `default` for entries without a defined width.
    pub fn width_b(&self, db: &mut Database, default: NodeId) -> NodeId {
        Self::width_of(&self.b, db, default)
    }

    fn width_of(entries: &[PairEntry], db: &mut Database, default: NodeId) -> NodeId {
        let mut total: Option<NodeId> = None;
        for entry in entries {
            let width = db.width_of(entry.flat.typ).unwrap_or(default);
            total = Some(match total {
                None => width,
                Some(total) => db.add(total, width),
            });
        }
        total.unwrap_or(default)
    }
}

/// A mapping between the flat views of two types.
#[derive(Debug, Clone)]
pub struct TypeMapper {
    name: String,
    a: TypeId,
    b: TypeId,
    fa: Vec<FlatType>,
    fb: Vec<FlatType>,
    matrix: MappingMatrix,
}

impl TypeMapper {
    /// Construct a mapper between two types. When both sides are the
    /// same type, the matrix is seeded with the identity.
    pub fn new(db: &Database, a: TypeId, b: TypeId) -> TypeMapper {
        let fa = flatten(db, a);
        let fb = flatten(db, b);
        let matrix = if a == b {
            MappingMatrix::identity(fa.len())
        } else {
            MappingMatrix::new(fa.len(), fb.len())
        };
        TypeMapper {
            name: cat!(db.typ(a).identifier(), "to", db.typ(b).identifier()),
            a,
            b,
            fa,
            fb,
            matrix,
        }
    }

    pub fn a(&self) -> TypeId {
        self.a
    }

    pub fn b(&self) -> TypeId {
        self.b
    }

    /// The flat view of the A side, captured at construction.
    pub fn flat_a(&self) -> &[FlatType] {
        &self.fa
    }

    /// The flat view of the B side, captured at construction.
    pub fn flat_b(&self) -> &[FlatType] {
        &self.fb
    }

    pub fn matrix(&self) -> &MappingMatrix {
        &self.matrix
    }

    pub(crate) fn set_matrix(&mut self, matrix: MappingMatrix) {
        self.matrix = matrix;
    }

    /// Map flat field `a` onto flat field `b`, assigning the next free
    /// ordinal in their group.
    pub fn add(&mut self, a: usize, b: usize) -> Result<&mut TypeMapper> {
        self.matrix.set_next(a, b)?;
        Ok(self)
    }

    /// Return true if this mapper applies to the given type pair, in
    /// either direction.
    pub fn can_convert(&self, a: TypeId, b: TypeId) -> bool {
        (self.a == a && self.b == b) || (self.a == b && self.b == a)
    }

    /// Return the inverse mapper: sides swapped, matrix transposed.
    pub fn inverse(&self) -> TypeMapper {
        TypeMapper {
            name: cat!(self.b_name(), "to", self.a_name()),
            a: self.b,
            b: self.a,
            fa: self.fb.clone(),
            fb: self.fa.clone(),
            matrix: self.matrix.transpose(),
        }
    }

    fn a_name(&self) -> &str {
        // The stored name is "<a>_to_<b>".
        self.name.split("_to_").next().unwrap_or("")
    }

    fn b_name(&self) -> &str {
        self.name.split("_to_").nth(1).unwrap_or("")
    }

    /// Group the nonzero cells into mapping pairs.
    ///
    /// Cells sharing a row or column belong to the same pair. Within a
    /// pair, each side is ordered by its concatenation ordinals (ties by
    /// flat index); the pairs themselves are ordered by their smallest
    /// A-side flat index.
    pub fn unique_mapping_pairs(&self) -> Vec<MappingPair> {
        let height = self.matrix.height();
        let width = self.matrix.width();
        let cell = |row: usize, col: usize| self.matrix.value(row, col);

        let mut row_seen = vec![false; height];
        let mut col_seen = vec![false; width];
        let mut pairs = Vec::new();

        for row in 0..height {
            for col in 0..width {
                if cell(row, col) == 0 || row_seen[row] {
                    continue;
                }
                // Collect the connected group around this cell.
                let mut rows = vec![];
                let mut cols = vec![];
                let mut row_queue = vec![row];
                let mut col_queue = vec![];
                while !row_queue.is_empty() || !col_queue.is_empty() {
                    if let Some(r) = row_queue.pop() {
                        if !row_seen[r] {
                            row_seen[r] = true;
                            rows.push(r);
                            for c in 0..width {
                                if cell(r, c) > 0 && !col_seen[c] {
                                    col_queue.push(c);
                                }
                            }
                        }
                    }
                    if let Some(c) = col_queue.pop() {
                        if !col_seen[c] {
                            col_seen[c] = true;
                            cols.push(c);
                            for r in 0..height {
                                if cell(r, c) > 0 && !row_seen[r] {
                                    row_queue.push(r);
                                }
                            }
                        }
                    }
                }

                // Order each side by concatenation ordinal, ties by
                // flat index.
                let mut row_keys: Vec<(usize, usize)> = rows
                    .iter()
                    .map(|&r| {
                        let ordinal = cols
                            .iter()
                            .map(|&c| cell(r, c))
                            .filter(|&v| v > 0)
                            .min()
                            .unwrap_or(0);
                        (ordinal, r)
                    })
                    .collect();
                let mut col_keys: Vec<(usize, usize)> = cols
                    .iter()
                    .map(|&c| {
                        let ordinal = rows
                            .iter()
                            .map(|&r| cell(r, c))
                            .filter(|&v| v > 0)
                            .min()
                            .unwrap_or(0);
                        (ordinal, c)
                    })
                    .collect();
                row_keys.sort_unstable();
                col_keys.sort_unstable();
                let rows: Vec<usize> = row_keys.into_iter().map(|(_, r)| r).collect();
                let cols: Vec<usize> = col_keys.into_iter().map(|(_, c)| c).collect();

                pairs.push(MappingPair {
                    a: rows
                        .into_iter()
                        .map(|index| PairEntry {
                            index,
                            flat: self.fa[index].clone(),
                        })
                        .collect(),
                    b: cols
                        .into_iter()
                        .map(|index| PairEntry {
                            index,
                            flat: self.fb[index].clone(),
                        })
                        .collect(),
                });
            }
        }
        pairs.sort_by_key(|pair| pair.min_index_a());
        pairs
    }
}

impl Identify for TypeMapper {
    fn identifier(&self) -> &str {
        self.name.as_str()
    }
}

impl Database {
    /// Register a mapper on its A-side type, replacing any previous
    /// mapper for the same type pair. The inverse mapper is registered
    /// on the B side.
    pub fn add_mapper(&mut self, mapper: TypeMapper) {
        let a = mapper.a();
        let b = mapper.b();
        if a != b {
            let inverse = mapper.inverse();
            let typ_b = self.typ_mut(b);
            typ_b.mappers.retain(|m| !m.can_convert(a, b));
            typ_b.mappers.push(inverse);
        }
        let typ_a = self.typ_mut(a);
        typ_a.mappers.retain(|m| !m.can_convert(a, b));
        typ_a.mappers.push(mapper);
    }

    /// Find a mapper from `a` to `b`. Identical types map by identity;
    /// otherwise the registered mappers of both types are searched and
    /// inverted as necessary.
    pub fn get_mapper(&self, a: TypeId, b: TypeId) -> Option<TypeMapper> {
        if a == b {
            return Some(TypeMapper::new(self, a, b));
        }
        for typ in &[a, b] {
            for mapper in &self.typ(*typ).mappers {
                if mapper.a() == a && mapper.b() == b {
                    return Some(mapper.clone());
                }
                if mapper.a() == b && mapper.b() == a {
                    return Some(mapper.inverse());
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typ::Field;

    fn record_pair(db: &mut Database) -> (TypeId, TypeId) {
        let wide = db.vec(4);
        let narrow = db.vec(2);
        let a = db
            .record(
                "rec_a",
                vec![
                    Field::new("q", wide, false),
                    Field::new("r", narrow, false),
                    Field::new("s", narrow, false),
                    Field::new("t", wide, false),
                ],
            )
            .unwrap();
        let b = db
            .record(
                "rec_b",
                vec![
                    Field::new("u", wide, false),
                    Field::new("v", narrow, false),
                    Field::new("w", narrow, false),
                    Field::new("x", wide, false),
                ],
            )
            .unwrap();
        (a, b)
    }

    #[test]
    fn ordinal_assignment() {
        let mut m = MappingMatrix::new(3, 3);
        m.set_next(0, 0).unwrap();
        assert_eq!(m.get(0, 0).unwrap(), 1);
        // Same column: next ordinal in the group.
        m.set_next(1, 0).unwrap();
        assert_eq!(m.get(1, 0).unwrap(), 2);
        // Same row as (1, 0): continues that group.
        m.set_next(1, 1).unwrap();
        assert_eq!(m.get(1, 1).unwrap(), 3);
        // Fresh group.
        m.set_next(2, 2).unwrap();
        assert_eq!(m.get(2, 2).unwrap(), 1);
    }

    #[test]
    fn matrix_bounds() {
        let m = MappingMatrix::new(2, 2);
        assert!(m.get(2, 0).is_err());
        assert!(m.get(0, 2).is_err());
    }

    #[test]
    fn transpose_involution() {
        let mut m = MappingMatrix::new(2, 3);
        m.set(0, 1, 1).unwrap();
        m.set(1, 2, 2).unwrap();
        assert_eq!(m.transpose().transpose(), m);
        assert_eq!(m.transpose().get(1, 0).unwrap(), 1);
    }

    #[test]
    fn identity_seeding() {
        let mut db = Database::new();
        let (a, _) = record_pair(&mut db);
        let mapper = TypeMapper::new(&db, a, a);
        let pairs = mapper.unique_mapping_pairs();
        assert_eq!(pairs.len(), 5);
        for (i, pair) in pairs.iter().enumerate() {
            assert_eq!(pair.num_a(), 1);
            assert_eq!(pair.num_b(), 1);
            assert_eq!(pair.index_a(0), i);
            assert_eq!(pair.index_b(0), i);
        }
    }

    #[test]
    fn mapper_shape_matches_flat_views() {
        let mut db = Database::new();
        let (a, b) = record_pair(&mut db);
        let mapper = TypeMapper::new(&db, a, b);
        assert_eq!(mapper.matrix().height(), flatten(&db, a).len());
        assert_eq!(mapper.matrix().width(), flatten(&db, b).len());
    }

    #[test]
    fn grouping_and_ordinal_order() {
        let mut db = Database::new();
        let (a, b) = record_pair(&mut db);
        // Flat indices: 0 head, 1 q, 2 r, 3 s, 4 t / 0 head, 1 u, 2 v,
        // 3 w, 4 x. Split q over v and w; concatenate s then r onto u.
        let mut mapper = TypeMapper::new(&db, a, b);
        mapper.add(0, 0).unwrap();
        mapper.add(1, 2).unwrap();
        mapper.add(1, 3).unwrap();
        mapper.add(3, 1).unwrap();
        mapper.add(2, 1).unwrap();
        mapper.add(4, 4).unwrap();

        let pairs = mapper.unique_mapping_pairs();
        assert_eq!(pairs.len(), 4);
        // Pairs ordered by smallest A index.
        assert_eq!(pairs[0].index_a(0), 0);
        // q -> {v, w}: one A entry, columns in ordinal order.
        assert_eq!(pairs[1].num_a(), 1);
        assert_eq!(pairs[1].num_b(), 2);
        assert_eq!(pairs[1].index_b(0), 2);
        assert_eq!(pairs[1].index_b(1), 3);
        // {s, r} -> u: s was added first, so it takes the first slot.
        assert_eq!(pairs[2].num_a(), 2);
        assert_eq!(pairs[2].index_a(0), 3);
        assert_eq!(pairs[2].index_a(1), 2);
        assert_eq!(pairs[2].num_b(), 1);
        // t -> x.
        assert_eq!(pairs[3].index_a(0), 4);
        assert_eq!(pairs[3].index_b(0), 4);
    }

    #[test]
    fn inverse_involution() {
        let mut db = Database::new();
        let (a, b) = record_pair(&mut db);
        let mut mapper = TypeMapper::new(&db, a, b);
        mapper.add(1, 2).unwrap();
        mapper.add(2, 1).unwrap();
        let double = mapper.inverse().inverse();
        assert_eq!(double.a(), mapper.a());
        assert_eq!(double.b(), mapper.b());
        assert_eq!(double.matrix(), mapper.matrix());
    }

    #[test]
    fn lookup_from_either_side() {
        let mut db = Database::new();
        let (a, b) = record_pair(&mut db);
        let mut mapper = TypeMapper::new(&db, a, b);
        mapper.add(1, 1).unwrap();
        db.add_mapper(mapper);

        let forward = db.get_mapper(a, b).unwrap();
        assert_eq!(forward.matrix().get(1, 1).unwrap(), 1);
        let backward = db.get_mapper(b, a).unwrap();
        assert_eq!(backward.matrix().get(1, 1).unwrap(), 1);
        assert_eq!(backward.a(), b);

        let v8 = db.vec(8);
        assert!(db.get_mapper(a, v8).is_none());
        assert!(db.get_mapper(v8, v8).is_some());
    }
}
