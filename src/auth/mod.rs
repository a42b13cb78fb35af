pub mod claims;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod utils;

pub use claims::Claims;
pub use jwt::JwtService;
pub use middleware::{AuthMiddleware, AuthenticatedUser, TOKEN_COOKIE};
pub use utils::{require_admin, require_owner_or_admin};
