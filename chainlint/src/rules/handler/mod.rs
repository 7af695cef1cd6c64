mod http_exception;
mod process_env;
mod unused_response;

pub use http_exception::HttpExceptionRule;
pub use process_env::ProcessEnvRule;
pub use unused_response::UnusedResponseRule;
