//! Type-erased component columns.
//!
//! A [`ComponentPool`] stores `len` fixed-size elements back to back. It has
//! no idea which Rust type it holds; typed access goes through
//! [`bytemuck`], which checks size and alignment on every cast, so a pool is
//! never read as a type it cannot represent.

use std::ops::Range;

use bytemuck::{Pod, Zeroable};

use crate::component::ComponentId;
use crate::error::EcsError;

/// Largest component alignment a pool can honour.
pub const MAX_COMPONENT_ALIGN: usize = 16;

/// Backing unit of a pool. Keeps the start of the buffer aligned to
/// [`MAX_COMPONENT_ALIGN`]; since a type's size is a multiple of its
/// alignment, every element then starts on a suitably aligned address.
#[derive(Clone, Copy)]
#[repr(C, align(16))]
struct Block([u8; MAX_COMPONENT_ALIGN]);

// SAFETY: `Block` is a byte array with no padding; any bit pattern is valid,
// including all zeroes.
unsafe impl Zeroable for Block {}
unsafe impl Pod for Block {}

fn blocks_for(bytes: usize) -> usize {
    bytes.div_ceil(MAX_COMPONENT_ALIGN)
}

/// A growable, contiguous buffer of fixed-size elements for one component
/// type: one column of an archetype.
///
/// The element size is configured once with
/// [`set_element_size`](Self::set_element_size) and never changes. New
/// elements are zero-filled.
#[derive(Clone)]
pub struct ComponentPool {
    component: ComponentId,
    element_size: Option<usize>,
    len: usize,
    blocks: Vec<Block>,
}

impl ComponentPool {
    /// Create an empty, unconfigured pool for the given component.
    #[must_use]
    pub fn new(component: ComponentId) -> Self {
        Self {
            component,
            element_size: None,
            len: 0,
            blocks: Vec::new(),
        }
    }

    /// Configure the per-element byte stride.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::ElementSizeAlreadySet`] if the stride was already
    /// configured, or [`EcsError::PoolNotEmpty`] if rows were added first.
    pub fn set_element_size(&mut self, size: usize) -> Result<&mut Self, EcsError> {
        if self.element_size.is_some() {
            return Err(EcsError::ElementSizeAlreadySet(self.component));
        }
        if self.len > 0 {
            return Err(EcsError::PoolNotEmpty {
                component: self.component,
                len: self.len,
            });
        }
        self.element_size = Some(size);
        Ok(self)
    }

    /// Returns the component stored in this pool.
    #[must_use]
    pub fn component(&self) -> ComponentId {
        self.component
    }

    /// Returns the per-element byte stride (zero until configured).
    #[must_use]
    pub fn element_size(&self) -> usize {
        self.element_size.unwrap_or(0)
    }

    /// Returns the number of elements stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the pool holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Reserve room for at least `additional` more elements.
    pub fn reserve(&mut self, additional: usize) {
        let needed = blocks_for((self.len + additional) * self.element_size());
        self.blocks.reserve(needed.saturating_sub(self.blocks.len()));
    }

    /// Append one zero-filled element, growing the pool by exactly one row.
    pub fn add_element(&mut self) -> &mut Self {
        let needed = blocks_for((self.len + 1) * self.element_size());
        if needed > self.blocks.len() {
            self.blocks.resize(needed, Block::zeroed());
        }
        self.len += 1;
        self
    }

    fn bytes(&self) -> &[u8] {
        let used = self.len * self.element_size();
        &bytemuck::cast_slice::<Block, u8>(&self.blocks)[..used]
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        let used = self.len * self.element_size();
        &mut bytemuck::cast_slice_mut::<Block, u8>(&mut self.blocks)[..used]
    }

    fn range(&self, row: usize) -> Result<Range<usize>, EcsError> {
        if row >= self.len {
            return Err(EcsError::RowOutOfRange { row, len: self.len });
        }
        let size = self.element_size();
        Ok(row * size..(row + 1) * size)
    }

    fn check_size<T>(&self) -> Result<(), EcsError> {
        let actual = std::mem::size_of::<T>();
        if actual != self.element_size() {
            return Err(EcsError::ElementSizeMismatch {
                component: self.component,
                expected: self.element_size(),
                actual,
            });
        }
        Ok(())
    }

    fn misaligned<T>() -> EcsError {
        EcsError::UnsupportedAlignment {
            type_name: std::any::type_name::<T>(),
            align: std::mem::align_of::<T>(),
            max: MAX_COMPONENT_ALIGN,
        }
    }

    /// Raw bytes of the element at `row`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::RowOutOfRange`] if `row >= len()`.
    pub fn element(&self, row: usize) -> Result<&[u8], EcsError> {
        let range = self.range(row)?;
        Ok(&self.bytes()[range])
    }

    /// Mutable raw bytes of the element at `row`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::RowOutOfRange`] if `row >= len()`.
    pub fn element_mut(&mut self, row: usize) -> Result<&mut [u8], EcsError> {
        let range = self.range(row)?;
        Ok(&mut self.bytes_mut()[range])
    }

    /// Typed view of the element at `row`.
    ///
    /// # Errors
    ///
    /// Fails if `T` does not match the element size or `row` is out of range.
    pub fn get<T: Pod>(&self, row: usize) -> Result<&T, EcsError> {
        self.check_size::<T>()?;
        let bytes = self.element(row)?;
        bytemuck::try_from_bytes(bytes).map_err(|_| Self::misaligned::<T>())
    }

    /// Mutable typed view of the element at `row`.
    ///
    /// # Errors
    ///
    /// Fails if `T` does not match the element size or `row` is out of range.
    pub fn get_mut<T: Pod>(&mut self, row: usize) -> Result<&mut T, EcsError> {
        self.check_size::<T>()?;
        let bytes = self.element_mut(row)?;
        bytemuck::try_from_bytes_mut(bytes).map_err(|_| Self::misaligned::<T>())
    }

    /// The whole column as a typed slice, for bulk iteration.
    ///
    /// Zero-sized types cannot be viewed as a slice; use [`iter`](Self::iter)
    /// for those.
    ///
    /// # Errors
    ///
    /// Fails if `T` does not match the element size or is zero-sized.
    pub fn as_slice<T: Pod>(&self) -> Result<&[T], EcsError> {
        self.check_size::<T>()?;
        bytemuck::try_cast_slice(self.bytes()).map_err(|_| Self::misaligned::<T>())
    }

    /// The whole column as a mutable typed slice.
    ///
    /// # Errors
    ///
    /// Fails if `T` does not match the element size or is zero-sized.
    pub fn as_mut_slice<T: Pod>(&mut self) -> Result<&mut [T], EcsError> {
        self.check_size::<T>()?;
        bytemuck::try_cast_slice_mut(self.bytes_mut()).map_err(|_| Self::misaligned::<T>())
    }

    /// Iterate over the elements in row order.
    #[must_use]
    pub fn iter(&self) -> Elements<'_> {
        Elements {
            pool: self,
            index: 0,
        }
    }
}

impl std::fmt::Debug for ComponentPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentPool")
            .field("component", &self.component)
            .field("element_size", &self.element_size)
            .field("len", &self.len)
            .finish()
    }
}

impl<'a> IntoIterator for &'a ComponentPool {
    type Item = ElementRef<'a>;
    type IntoIter = Elements<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Row-order iterator over a [`ComponentPool`].
#[derive(Debug, Clone)]
pub struct Elements<'a> {
    pool: &'a ComponentPool,
    index: usize,
}

impl<'a> Iterator for Elements<'a> {
    type Item = ElementRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.pool.len {
            return None;
        }
        let element = ElementRef {
            pool: self.pool,
            index: self.index,
        };
        self.index += 1;
        Some(element)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.pool.len - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Elements<'_> {}

/// A handle to one element of a pool, typed on read.
#[derive(Debug, Clone, Copy)]
pub struct ElementRef<'a> {
    pool: &'a ComponentPool,
    index: usize,
}

impl<'a> ElementRef<'a> {
    /// The row this element lives at.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// The element's raw bytes.
    #[must_use]
    pub fn bytes(&self) -> &'a [u8] {
        let size = self.pool.element_size();
        &self.pool.bytes()[self.index * size..(self.index + 1) * size]
    }

    /// Read the element as `T`.
    ///
    /// # Errors
    ///
    /// Fails if `T` does not match the pool's element size.
    pub fn get<T: Pod>(&self) -> Result<&'a T, EcsError> {
        self.pool.get(self.index)
    }
}
