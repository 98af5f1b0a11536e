//! Addressable collections of context models.

use std::fmt;
use std::ops::{Index, IndexMut};

use super::ContextModel;
use crate::error::{CabacError, Result};

/// Slice type selecting the init table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SliceType {
    /// Intra-only slice
    I = 0,
    /// Uni-predicted slice
    P = 1,
    /// Bi-predicted slice
    B = 2,
}

impl SliceType {
    /// Number of init table rows.
    pub const COUNT: usize = 3;

    /// Row used when `cabac_init_flag` is signalled: P and B swap tables.
    pub fn with_cabac_init_flag(self, cabac_init_flag: bool) -> Self {
        match (self, cabac_init_flag) {
            (Self::P, true) => Self::B,
            (Self::B, true) => Self::P,
            (slice_type, _) => slice_type,
        }
    }

    fn row(self) -> usize {
        self as usize
    }
}

/// Declared extent of a context set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextShape {
    /// Number of component classes (e.g. luma/chroma)
    pub components: usize,
    /// Number of size classes per component
    pub size_classes: usize,
    /// Number of contexts per size class
    pub contexts: usize,
}

impl ContextShape {
    pub const fn new(components: usize, size_classes: usize, contexts: usize) -> Self {
        Self {
            components,
            size_classes,
            contexts,
        }
    }

    /// Shape of a flat list of contexts.
    pub const fn flat(contexts: usize) -> Self {
        Self::new(1, 1, contexts)
    }

    /// Total number of contexts.
    pub const fn len(&self) -> usize {
        self.components * self.size_classes * self.contexts
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flat index of an address, `None` when out of range.
    #[inline]
    pub fn index_of(&self, address: ContextAddress) -> Option<usize> {
        if address.component >= self.components
            || address.size_class >= self.size_classes
            || address.index >= self.contexts
        {
            return None;
        }
        Some((address.component * self.size_classes + address.size_class) * self.contexts + address.index)
    }

    /// Every address of the shape in storage order.
    pub fn addresses(&self) -> impl Iterator<Item = ContextAddress> + '_ {
        (0..self.components).flat_map(move |component| {
            (0..self.size_classes).flat_map(move |size_class| {
                (0..self.contexts).map(move |index| ContextAddress::new(component, size_class, index))
            })
        })
    }
}

impl fmt::Display for ContextShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.components, self.size_classes, self.contexts)
    }
}

/// Location of one context inside a set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ContextAddress {
    pub component: usize,
    pub size_class: usize,
    pub index: usize,
}

impl ContextAddress {
    pub const fn new(component: usize, size_class: usize, index: usize) -> Self {
        Self {
            component,
            size_class,
            index,
        }
    }

    /// Address inside a flat (1x1xN) set.
    pub const fn flat(index: usize) -> Self {
        Self::new(0, 0, index)
    }
}

impl fmt::Display for ContextAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.component, self.size_class, self.index)
    }
}

/// Init values for a context set, one row per slice type.
///
/// Values are laid out `[slice_type][flat context index]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitTable {
    shape: ContextShape,
    values: Vec<u8>,
}

impl InitTable {
    /// Build a table from all three rows.
    pub fn new(shape: ContextShape, values: Vec<u8>) -> Result<Self> {
        let expected = shape.len() * SliceType::COUNT;
        if values.len() != expected {
            return Err(CabacError::InitTableShape {
                expected,
                actual: values.len(),
            });
        }
        Ok(Self { shape, values })
    }

    /// Build a table using the same row for every slice type.
    pub fn uniform(shape: ContextShape, row: &[u8]) -> Result<Self> {
        if row.len() != shape.len() {
            return Err(CabacError::InitTableShape {
                expected: shape.len(),
                actual: row.len(),
            });
        }
        Ok(Self {
            shape,
            values: row.repeat(SliceType::COUNT),
        })
    }

    /// Build a table with one init value everywhere.
    pub fn filled(shape: ContextShape, init_value: u8) -> Self {
        Self {
            shape,
            values: vec![init_value; shape.len() * SliceType::COUNT],
        }
    }

    pub fn shape(&self) -> ContextShape {
        self.shape
    }

    /// Init values for one slice type.
    pub fn row(&self, slice_type: SliceType) -> &[u8] {
        let len = self.shape.len();
        let start = slice_type.row() * len;
        &self.values[start..start + len]
    }
}

/// Value copy of a [`ContextModelSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextSetSnapshot {
    shape: ContextShape,
    models: Vec<ContextModel>,
}

impl ContextSetSnapshot {
    pub fn shape(&self) -> ContextShape {
        self.shape
    }
}

/// Contexts owned by one coder instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextModelSet {
    shape: ContextShape,
    models: Vec<ContextModel>,
}

impl ContextModelSet {
    /// Allocate a set with every context at state 0, MPS 0.
    pub fn new(shape: ContextShape) -> Self {
        Self {
            shape,
            models: vec![ContextModel::default(); shape.len()],
        }
    }

    /// Allocate and initialize a set from an init table.
    pub fn from_table(table: &InitTable, slice_type: SliceType, qp: i32) -> Self {
        let mut set = Self::new(table.shape());
        set.init_rows(table.row(slice_type), qp);
        set
    }

    /// Re-initialize every context for a slice.
    pub fn init_all(&mut self, table: &InitTable, slice_type: SliceType, qp: i32) -> Result<()> {
        if table.shape() != self.shape {
            return Err(CabacError::ShapeMismatch {
                expected: self.shape,
                actual: table.shape(),
            });
        }
        self.init_rows(table.row(slice_type), qp);
        Ok(())
    }

    fn init_rows(&mut self, row: &[u8], qp: i32) {
        for (model, &init_value) in self.models.iter_mut().zip(row) {
            model.init(init_value, qp);
        }
    }

    pub fn shape(&self) -> ContextShape {
        self.shape
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Look up a context.
    #[inline]
    pub fn get(&self, address: ContextAddress) -> Result<&ContextModel> {
        match self.shape.index_of(address) {
            Some(idx) => Ok(&self.models[idx]),
            None => Err(self.invalid(address)),
        }
    }

    /// Look up a context for coding.
    #[inline]
    pub fn get_mut(&mut self, address: ContextAddress) -> Result<&mut ContextModel> {
        match self.shape.index_of(address) {
            Some(idx) => Ok(&mut self.models[idx]),
            None => Err(self.invalid(address)),
        }
    }

    fn invalid(&self, address: ContextAddress) -> CabacError {
        CabacError::InvalidAddress {
            address,
            shape: self.shape,
        }
    }

    /// Contexts in storage order.
    pub fn iter(&self) -> impl Iterator<Item = &ContextModel> {
        self.models.iter()
    }

    /// Deep copy of every context.
    pub fn snapshot(&self) -> ContextSetSnapshot {
        ContextSetSnapshot {
            shape: self.shape,
            models: self.models.clone(),
        }
    }

    /// Reinstate a snapshot taken from this set (or one of the same shape).
    pub fn restore(&mut self, snapshot: &ContextSetSnapshot) {
        self.shape = snapshot.shape;
        self.models.clone_from(&snapshot.models);
    }
}

impl Index<ContextAddress> for ContextModelSet {
    type Output = ContextModel;

    fn index(&self, address: ContextAddress) -> &ContextModel {
        match self.shape.index_of(address) {
            Some(idx) => &self.models[idx],
            None => panic!("context address {} out of range {}", address, self.shape),
        }
    }
}

impl IndexMut<ContextAddress> for ContextModelSet {
    fn index_mut(&mut self, address: ContextAddress) -> &mut ContextModel {
        match self.shape.index_of(address) {
            Some(idx) => &mut self.models[idx],
            None => panic!("context address {} out of range {}", address, self.shape),
        }
    }
}
