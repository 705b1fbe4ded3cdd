//! Identity service models

pub mod auth;
pub mod role;
pub mod token;
pub mod user;

pub use auth::{LoginRequest, RegisterRequest, TokenResponse};
pub use role::Role;
pub use token::TokenRecord;
pub use user::{CreateUserRequest, MeResponse, NewUser, ProfileResponse, User, UserResponse};
