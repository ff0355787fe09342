//! Region-based IR substrate for the parlow lowering passes.
//!
//! The model follows the usual op/region/block/value shape: a [`Module`]
//! owns a top-level block of functions; ops own regions, regions own
//! blocks, blocks own ordered ops and typed arguments. Storage is
//! arena-based with typed handles, and def-use edges are mirrored in
//! explicit use lists kept consistent by the [`Module`] mutation API.
//!
//! The operation set ([`OpKind`]) is closed: it covers exactly the
//! vocabulary the lowering passes in `parlow-lower` construct and match.

pub mod builder;
pub mod error;
pub mod module;
pub mod op;
pub mod print;
pub mod types;
pub mod verify;

pub use builder::OpBuilder;
pub use error::{Error, Result};
pub use module::{BlockId, Module, OpId, RegionId, Use, ValueDef, ValueId};
pub use op::{FuncSig, OpKind};
pub use print::print_module;
pub use types::{AffineExpr, AffineMap, ConstValue, Dim, Type, Vendor, SHARED_ADDR_SPACE};
pub use verify::{assert_valid, verify};
