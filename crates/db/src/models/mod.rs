pub mod face;
pub mod file;
pub mod group;

pub use face::Face;
pub use file::{DeletedFace, MediaFile};
pub use group::FaceGroup;
