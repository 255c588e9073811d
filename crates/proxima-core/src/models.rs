pub mod address;
pub mod coords;
pub mod field;
pub mod options;
pub mod query;
pub mod subfield;
pub mod target;

pub use address::{AddressRecord, StreetFormat};
pub use coords::{Coordinates, DEFAULT_COORDINATES};
pub use field::{AddressField, FieldDescriptor, FieldKind};
pub use options::{ProximityOptions, Units, DEFAULT_RANGE};
pub use query::{
    Bound, ColumnExpr, ComputedColumn, DistanceExpr, Join, Placement, Predicate, Scalar,
    DISTANCE_COLUMN,
};
pub use subfield::{SubfieldFilter, SubfieldOption};
pub use target::{AddressQuery, Target};
