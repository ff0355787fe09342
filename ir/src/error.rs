use snafu::Snafu;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Two module-level functions share a name.
    #[snafu(display("symbol `{name}` is already defined in this module"))]
    DuplicateSymbol { name: String },

    /// An operand slot and the use list of its value disagree.
    #[snafu(display("use edge out of sync: operand {index} of op #{op} is not mirrored by value #{value}"))]
    BrokenUseEdge { op: usize, index: usize, value: usize },

    /// A use list names an operand slot holding a different value.
    #[snafu(display("stale use edge: value #{value} lists op #{op} operand {index}, which holds another value"))]
    StaleUseEdge { op: usize, index: usize, value: usize },

    /// A block lists an op that does not point back at it.
    #[snafu(display("parent link broken: op #{op} is listed by a block it does not name as parent"))]
    BrokenParentLink { op: usize },

    /// A terminator appears before the end of its block.
    #[snafu(display("terminator in non-final position in block #{block}"))]
    MisplacedTerminator { block: usize },

    /// A non-empty block does not end in a terminator.
    #[snafu(display("block #{block} is missing a terminator"))]
    MissingTerminator { block: usize },
}
