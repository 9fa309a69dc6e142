use crate::{
    db::{DbPool, OrmConn},
    gateway::PaymentGateway,
    middleware::auth::RoutePolicy,
    services::token_service::TokenService,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub tokens: TokenService,
    pub gateway: PaymentGateway,
    pub policy: RoutePolicy,
}
