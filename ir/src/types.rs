//! Value types, constants and affine maps.
//!
//! The type lattice is deliberately small: it covers exactly what the
//! lowering passes inspect. `Ptr` and `MemRef` carry a numeric address
//! space; space [`SHARED_ADDR_SPACE`] marks per-block shared memory that
//! kernel lowering rewrites into ordinary (space 0) allocations.

use smallvec::SmallVec;

/// Address space used by device front-ends for block-shared allocations.
pub const SHARED_ADDR_SPACE: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// Platform-sized loop/index integer.
    Index,
    /// Integer of the given bit width.
    Int(u32),
    /// Float of the given bit width.
    Float(u32),
    /// Raw pointer into the given address space.
    Ptr { elem: Box<Type>, space: u32 },
    /// Shaped buffer. `shape` entries are static extents.
    MemRef { elem: Box<Type>, shape: SmallVec<[i64; 4]>, space: u32 },
    /// Async dependency token.
    Token,
    /// Device-stream token prior to reconversion.
    DeviceToken,
}

impl Type {
    pub fn i8_ptr() -> Self {
        Type::Ptr { elem: Box::new(Type::Int(8)), space: 0 }
    }

    /// Bit width when the type is an integer.
    pub fn int_width(&self) -> Option<u32> {
        match self {
            Type::Int(w) => Some(*w),
            _ => None,
        }
    }

    /// Address space for pointer-like types.
    pub fn addr_space(&self) -> Option<u32> {
        match self {
            Type::Ptr { space, .. } | Type::MemRef { space, .. } => Some(*space),
            _ => None,
        }
    }

    /// Same pointer-like type with the address space replaced.
    pub fn with_addr_space(&self, new_space: u32) -> Option<Type> {
        match self {
            Type::Ptr { elem, .. } => Some(Type::Ptr { elem: elem.clone(), space: new_space }),
            Type::MemRef { elem, shape, .. } => {
                Some(Type::MemRef { elem: elem.clone(), shape: shape.clone(), space: new_space })
            }
            _ => None,
        }
    }
}

/// One axis of a 3-D launch configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dim {
    X,
    Y,
    Z,
}

impl Dim {
    pub const ALL: [Dim; 3] = [Dim::X, Dim::Y, Dim::Z];

    pub fn index(self) -> usize {
        match self {
            Dim::X => 0,
            Dim::Y => 1,
            Dim::Z => 2,
        }
    }
}

/// Device vendor a barrier intrinsic is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vendor {
    Cuda,
    Hip,
}

/// Compile-time constant payload of a `Constant` op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstValue {
    Index(i64),
    Int { value: i64, width: u32 },
}

impl ConstValue {
    /// The type a constant op with this payload produces.
    pub fn ty(&self) -> Type {
        match self {
            ConstValue::Index(_) => Type::Index,
            ConstValue::Int { width, .. } => Type::Int(*width),
        }
    }
}

/// Affine expression over loop dims and symbols.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AffineExpr {
    Dim(usize),
    Sym(usize),
    Const(i64),
    Add(Box<AffineExpr>, Box<AffineExpr>),
    Mul(Box<AffineExpr>, Box<AffineExpr>),
}

/// Multi-result affine map: `(d0..dN)[s0..sM] -> (e0, .., eK)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AffineMap {
    pub num_dims: usize,
    pub num_syms: usize,
    pub results: Vec<AffineExpr>,
}

impl AffineMap {
    /// `(d0..dN) -> (d0, .., dN)`.
    pub fn identity(num_dims: usize) -> Self {
        AffineMap { num_dims, num_syms: 0, results: (0..num_dims).map(AffineExpr::Dim).collect() }
    }

    /// Single-result slice keeping the full dim/symbol signature.
    pub fn single_result(&self, i: usize) -> AffineMap {
        AffineMap { num_dims: self.num_dims, num_syms: self.num_syms, results: vec![self.results[i].clone()] }
    }

    /// Whether this map is exactly `(d0) -> (d0)`.
    pub fn is_single_dim_identity(&self) -> bool {
        self.num_dims == 1 && self.num_syms == 0 && self.results == [AffineExpr::Dim(0)]
    }
}
