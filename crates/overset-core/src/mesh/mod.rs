mod boundary_face;
mod cell;
mod component;
mod node;
mod view;

pub use boundary_face::BoundaryFace;
pub use cell::{Cell, CellType};
pub use component::identify_components;
pub use node::{BcTag, ComponentId, GlobalId, Node, Rank};
pub use view::MeshView;

#[cfg(test)]
pub use view::test_support;
