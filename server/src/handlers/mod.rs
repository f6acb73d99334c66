pub mod guest_token;
pub mod health;

use actix_web::web;

pub use guest_token::guest_token;
pub use health::health_check;

pub const GUEST_TOKEN_PATH: &str = "/guest-token";

/// Registers every public route. Callers provide `web::Data<RelayConfig>`
/// and `web::Data<TokenRelay>`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health_check)
        .service(web::resource(GUEST_TOKEN_PATH).route(web::route().to(guest_token)));
}
