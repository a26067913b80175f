//! Version 1 request and response contracts exposed over HTTP

pub mod requests;
pub mod responses;

pub use requests::{
    ConfirmEmailRequest, CreateRoleRequest, LoginRequest, RefreshTokenRequest, RegisterRequest, UserInsertRequest,
    UserSearchRequest, UserUpdateRequest,
};
pub use responses::{
    AuthResponse, PagedResponse, RegisterResponse, RoleResponse, UserResponse,
};
