pub mod auth;
pub mod body;
pub mod response;

pub use auth::{jwt_auth_middleware, AuthUser};
pub use body::OptionalJson;
pub use response::{ApiResponse, ApiResult};
