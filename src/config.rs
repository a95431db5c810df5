// src/config.rs

use std::{env, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{
        CollectionRepository, CommunityRepository, DeliveryRouteRepository, MunicipalityRepository,
        OrderRepository, ReportRepository, TicketRepository, UserRepository,
    },
    services::{
        auth::AuthService,
        catalog_service::CatalogService,
        collection_service::CollectionService,
        document_service::DocumentService,
        mail_service::{LogMailer, MailService, Mailer, ResendMailer},
        order_service::OrderService,
        report_service::ReportService,
        storage_service::{FileStorage, HttpStorage, LocalStorage},
        ticket_service::TicketService,
        user_service::UserService,
    },
};

// Onde os PDFs de cobranza são publicados
#[derive(Debug, Clone)]
pub enum StorageConfig {
    Local {
        dir: PathBuf,
        public_base_url: String,
    },
    Http {
        upload_url: String,
        token: Option<String>,
        public_base_url: String,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_maxage_hours: i64,
    pub production: bool,
    pub allowed_origins: Vec<String>,
    pub host: String,
    pub port: u16,
    pub frontend_url: String,
    pub resend_api_key: Option<String>,
    pub mail_from: String,
    pub storage: StorageConfig,
    pub pdf_font_dir: String,
    pub pdf_font_name: String,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).ok().filter(|v| !v.trim().is_empty()).unwrap_or_else(|| default.to_string())
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let storage = match var_or("STORAGE_DRIVER", "local").as_str() {
            "http" => StorageConfig::Http {
                upload_url: env::var("STORAGE_UPLOAD_URL")
                    .context("STORAGE_UPLOAD_URL deve ser definida com STORAGE_DRIVER=http")?,
                token: optional_var("STORAGE_TOKEN"),
                public_base_url: var_or("STORAGE_PUBLIC_BASE_URL", ""),
            },
            "local" => StorageConfig::Local {
                dir: PathBuf::from(var_or("STORAGE_LOCAL_DIR", "./storage")),
                public_base_url: var_or("STORAGE_PUBLIC_BASE_URL", "/archivos"),
            },
            other => anyhow::bail!("STORAGE_DRIVER desconhecido: {}", other),
        };

        Ok(Self {
            database_url,
            db_max_connections: var_or("DB_MAX_CONNECTIONS", "5")
                .parse()
                .context("DB_MAX_CONNECTIONS inválido")?,
            jwt_secret,
            jwt_maxage_hours: var_or("JWT_MAXAGE_HOURS", "168")
                .parse()
                .context("JWT_MAXAGE_HOURS inválido")?,
            production: var_or("APP_ENV", "development") == "production",
            allowed_origins: var_or("ORIGIN", "http://localhost:5173")
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect(),
            host: var_or("HOST", "0.0.0.0"),
            port: var_or("PORT", "3000").parse().context("PORT inválida")?,
            frontend_url: var_or("FRONTEND_URL", "http://localhost:5173"),
            resend_api_key: optional_var("RESEND_API_KEY"),
            mail_from: var_or("MAIL_FROM", "BAMX <no-reply@bamx.org.mx>"),
            storage,
            pdf_font_dir: var_or("PDF_FONT_DIR", "./fonts"),
            pdf_font_name: var_or("PDF_FONT_NAME", "Roboto"),
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<Config>,
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub catalog_service: CatalogService,
    pub order_service: OrderService,
    pub collection_service: CollectionService,
    pub ticket_service: TicketService,
    pub report_service: ReportService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = Config::from_env()?;

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::from_parts(config, db_pool))
    }

    // Monta o gráfico de dependências a partir de uma pool já criada
    pub fn from_parts(config: Config, db_pool: PgPool) -> Self {
        let mailer: Arc<dyn Mailer> = match &config.resend_api_key {
            Some(key) => Arc::new(ResendMailer::new(key.clone(), config.mail_from.clone())),
            None => {
                tracing::warn!("RESEND_API_KEY ausente: e-mails serão apenas registrados no log.");
                Arc::new(LogMailer)
            }
        };
        let mail_service = MailService::new(mailer, config.frontend_url.clone());

        let storage: Arc<dyn FileStorage> = match &config.storage {
            StorageConfig::Local { dir, public_base_url } => {
                Arc::new(LocalStorage::new(dir.clone(), public_base_url.clone()))
            }
            StorageConfig::Http { upload_url, token, public_base_url } => Arc::new(HttpStorage::new(
                upload_url.clone(),
                token.clone(),
                public_base_url.clone(),
            )),
        };

        let user_repo = UserRepository::new(db_pool.clone());
        let route_repo = DeliveryRouteRepository::new(db_pool.clone());
        let municipality_repo = MunicipalityRepository::new(db_pool.clone());
        let community_repo = CommunityRepository::new(db_pool.clone());
        let order_repo = OrderRepository::new(db_pool.clone());
        let collection_repo = CollectionRepository::new(db_pool.clone());
        let ticket_repo = TicketRepository::new(db_pool.clone());
        let report_repo = ReportRepository::new(db_pool.clone());

        let auth_service = AuthService::new(
            user_repo.clone(),
            mail_service.clone(),
            config.jwt_secret.clone(),
            config.jwt_maxage_hours,
        );
        let user_service = UserService::new(user_repo.clone(), mail_service.clone());
        let catalog_service = CatalogService::new(
            route_repo.clone(),
            municipality_repo,
            community_repo,
        );
        let order_service = OrderService::new(
            db_pool.clone(),
            order_repo.clone(),
            collection_repo.clone(),
            route_repo,
            user_repo.clone(),
        );
        let document_service = DocumentService::new(
            config.pdf_font_dir.clone(),
            config.pdf_font_name.clone(),
        );
        let collection_service = CollectionService::new(
            db_pool.clone(),
            order_service.clone(),
            order_repo,
            collection_repo,
            document_service,
            storage,
        );
        let ticket_service = TicketService::new(ticket_repo, user_repo, mail_service);
        let report_service = ReportService::new(report_repo);

        Self {
            db_pool,
            config: Arc::new(config),
            auth_service,
            user_service,
            catalog_service,
            order_service,
            collection_service,
            ticket_service,
            report_service,
        }
    }
}
