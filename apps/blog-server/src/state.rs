//! Application state - shared across all handlers.

use std::sync::Arc;

use blog_core::ports::{
    CommentRepository, PasswordService, PostRepository, TokenService, UserRepository,
};
use blog_infra::{
    Argon2PasswordService, InMemoryCommentRepository, InMemoryPostRepository, InMemoryStore,
    InMemoryUserRepository, JwtConfig, JwtTokenService,
};

use crate::config::{AppConfig, SessionConfig};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
    pub session: SessionConfig,
}

impl AppState {
    /// Build the application state, falling back to the in-memory store when
    /// no database is configured or reachable.
    pub async fn new(config: &AppConfig) -> Self {
        let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::new(config.jwt.clone()));
        let hasher = Argon2PasswordService::new(&config.passwords).unwrap_or_else(|e| {
            tracing::warn!("{}. Using default Argon2 parameters.", e);
            Argon2PasswordService::default()
        });
        let passwords: Arc<dyn PasswordService> = Arc::new(hasher);

        #[cfg(feature = "postgres")]
        {
            if let Some(db_config) = &config.database {
                match connect(db_config).await {
                    Ok(repos) => {
                        tracing::info!("Application state initialized (postgres)");
                        return repos.with_services(tokens, passwords, config.session.clone());
                    }
                    Err(e) => {
                        tracing::error!(
                            "Failed to connect to database: {}. Using in-memory fallback.",
                            e
                        );
                    }
                }
            } else {
                tracing::warn!(
                    "DATABASE_URL not set. Running without database (in-memory mode)."
                );
            }
        }

        #[cfg(not(feature = "postgres"))]
        tracing::info!("Running without postgres feature - using in-memory repositories");

        tracing::info!("Application state initialized (in-memory)");
        Self::in_memory_with(tokens, passwords, config.session.clone())
    }

    /// State backed by a fresh in-memory store.
    pub fn in_memory(jwt: JwtConfig, session: SessionConfig) -> Self {
        Self::in_memory_with(
            Arc::new(JwtTokenService::new(jwt)),
            Arc::new(Argon2PasswordService::default()),
            session,
        )
    }

    fn in_memory_with(
        tokens: Arc<dyn TokenService>,
        passwords: Arc<dyn PasswordService>,
        session: SessionConfig,
    ) -> Self {
        let store = InMemoryStore::new();
        Self {
            users: Arc::new(InMemoryUserRepository::new(store.clone())),
            posts: Arc::new(InMemoryPostRepository::new(store.clone())),
            comments: Arc::new(InMemoryCommentRepository::new(store)),
            tokens,
            passwords,
            session,
        }
    }
}

#[cfg(feature = "postgres")]
struct Repositories {
    users: Arc<dyn UserRepository>,
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
}

#[cfg(feature = "postgres")]
impl Repositories {
    fn with_services(
        self,
        tokens: Arc<dyn TokenService>,
        passwords: Arc<dyn PasswordService>,
        session: SessionConfig,
    ) -> AppState {
        AppState {
            users: self.users,
            posts: self.posts,
            comments: self.comments,
            tokens,
            passwords,
            session,
        }
    }
}

#[cfg(feature = "postgres")]
async fn connect(
    config: &blog_infra::database::DatabaseConfig,
) -> Result<Repositories, migration::DbErr> {
    use blog_infra::database::{
        DatabaseConnections, PostgresCommentRepository, PostgresPostRepository,
        PostgresUserRepository,
    };
    use migration::{Migrator, MigratorTrait};

    let connections = DatabaseConnections::init(config).await?;
    if config.auto_migrate {
        Migrator::up(&connections.main, None).await?;
        tracing::info!("Database migrations applied");
    }

    Ok(Repositories {
        users: Arc::new(PostgresUserRepository::new(connections.handle())),
        posts: Arc::new(PostgresPostRepository::new(connections.handle())),
        comments: Arc::new(PostgresCommentRepository::new(connections.main)),
    })
}
