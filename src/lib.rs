pub mod cache;
pub mod context;
pub mod db;
pub mod extractors;
pub mod generator;
pub mod handlers;
pub mod models;
pub mod names;
pub mod quiz;
pub mod rejections;
pub mod services;
pub mod storage;
pub mod utils;

use axum::Router;

use context::Contexts;
use db::Db;
use generator::HttpQuizGenerator;
use services::{
    auth::AuthService, engagement::EngagementService, quiz::QuizService, upload::UploadService,
};
use storage::LocalObjectStore;

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub auth: AuthService,
    pub quiz: QuizService,
    pub engagement: EngagementService,
    pub upload: UploadService<HttpQuizGenerator, LocalObjectStore>,
    pub storage: LocalObjectStore,
    pub contexts: Contexts,
    pub secure_cookies: bool,
}

impl AppState {
    pub fn new(
        db: Db,
        generator: HttpQuizGenerator,
        storage: LocalObjectStore,
        secure_cookies: bool,
    ) -> Self {
        Self {
            auth: AuthService::new(db.clone()),
            quiz: QuizService::new(db.clone(), db.clone()),
            engagement: EngagementService::new(db.clone()),
            upload: UploadService::new(generator, storage.clone(), db.clone()),
            storage,
            contexts: Contexts::new(),
            secure_cookies,
            db,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(handlers::homepage::routes())
        .merge(handlers::account::routes())
        .merge(handlers::video::routes())
        .merge(handlers::engagement::routes())
        .merge(handlers::quiz::routes())
        .merge(handlers::profile::routes())
        .with_state(state)
}
