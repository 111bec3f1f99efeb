pub mod path;
pub mod random;
pub mod response;
pub mod upload;
