pub mod password;
pub mod policy;
pub mod session;

pub use session::SessionContent;
