mod request;
mod response;

pub use request::{CommandLogRequest, CommandType, SessionRequest};
pub use response::{CommandLogResponse, SessionEndResponse, SessionStartResponse};
