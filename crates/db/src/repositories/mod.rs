pub mod face_repo;
pub mod file_repo;
pub mod group_repo;

pub use face_repo::FaceRepo;
pub use file_repo::FileRepo;
pub use group_repo::GroupRepo;
