use actix_web::{test, web, App};
use guest_token_relay::config::RelayConfig;
use guest_token_relay::handlers;

#[actix_web::test]
async fn test_health_check() {
    let config = RelayConfig::from_toml_str(
        r#"
[credentials]
username = "admin"
password = "1234"
referer = "https://portal.example.com"

[upstream]
timeout_secs = 12
        "#,
    )
    .unwrap();

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(config))
            .service(handlers::health_check),
    )
    .await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;

    assert!(resp.status().is_success());

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["upstream_timeout_secs"], 12);
}
