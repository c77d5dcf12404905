//! Family tree model for Kindred.
//!
//! A [`Graph`] is an immutable snapshot. Edits in [`mutate`] return a new
//! snapshot that shares every untouched subtree with the old one; queries,
//! kinship resolution and layout are recomputed from whichever snapshot is
//! current.

pub mod error;
pub mod filter;
pub mod interact;
pub mod interchange;
pub mod kinship;
pub mod layout;
pub mod model;
pub mod mutate;
pub mod settings;
pub mod storage;
pub mod traverse;

pub use error::{ImportError, LibraryError, TreeError};
pub use filter::{birth_year, filter, FilterCriteria};
pub use interact::{highlight_set, navigate, reduce, Action, AppState, Controller, Direction, Move};
pub use interchange::{export_json, import_json};
pub use kinship::{resolve, Relationship, RelationshipCategory};
pub use layout::{
    compute_layout, Bounds, Canvas, EdgeKind, LayoutEdge, LayoutSettings, LinkStyle, Orientation, Point,
    PositionedNode, TreeLayout, Viewport,
};
pub use model::{Connection, Edit, Gender, Graph, Member, MemberId, Root, FOREST_ROOT_ID, SPOUSE_LABEL};
pub use mutate::{
    add_connection, delete_cascade, insert_child, insert_parent, insert_sibling, insert_spouse, next_member_id,
    remove_connection, remove_spouse, update_member,
};
pub use settings::{ai_configured, read_settings, write_settings, AiSettings, Backend, Settings, StorageSettings};
pub use storage::{kindred_dir, Library};
pub use traverse::{
    collect_ancestors, collect_descendants, find_by_id, find_parent, flatten, lineage, path_to_root, stats,
    TreeStats,
};
