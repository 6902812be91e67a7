//! Authentication and authorization

pub mod gate;
pub mod jwt;
pub mod password;
pub mod roles;

pub use gate::{AccessGate, Principal};
pub use jwt::{Claims, IssuedToken, JwtCodec, TokenInput};
pub use password::CredentialHasher;
pub use roles::{Role, RoleSet, UserStatus};
