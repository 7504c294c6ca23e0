mod repo;

pub use repo::UserProfile;
