use std::sync::Arc;

use tracing::instrument;
use uuid::Uuid;

use super::{Registration, register_user};
use crate::{
    error::{AuthError, AuthResult},
    models::{CreateUserRequest, MeResponse, ProfileResponse, User},
    repositories::UserStore,
};

#[derive(Clone)]
pub struct UsersService {
    users: Arc<dyn UserStore>,
}

impl UsersService {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Administrative creation; the caller picks the role
    #[instrument(skip_all)]
    pub async fn create(&self, request: CreateUserRequest) -> AuthResult<User> {
        register_user(
            self.users.as_ref(),
            Registration {
                email: request.email,
                username: request.username,
                password: request.password,
                first_name: request.first_name,
                last_name: request.last_name,
                role: request.role,
            },
        )
        .await
    }

    pub async fn me(&self, user_id: Uuid) -> AuthResult<MeResponse> {
        Ok(self.find(user_id).await?.into())
    }

    pub async fn profile(&self, user_id: Uuid) -> AuthResult<ProfileResponse> {
        Ok(self.find(user_id).await?.into())
    }

    async fn find(&self, user_id: Uuid) -> AuthResult<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AuthError::NotFound("User not found".to_string()))
    }
}
