pub mod generated;
pub mod request;
pub mod response;

pub use generated::*;
pub use request::*;
pub use response::*;
