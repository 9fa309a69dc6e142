use hmac::{Hmac, Mac};
use sha2::Sha256;

use storefront_api::{
    config::GatewayConfig,
    gateway::PaymentGateway,
    middleware::auth::RoutePolicy,
    models::Role,
    services::token_service::TokenService,
};

#[test]
fn policy_allows_roles_by_path_prefix() {
    let policy = RoutePolicy::default();

    // Admin paths require the ADMIN role.
    assert!(policy.allows("/admin/business/overall", Role::Admin));
    assert!(!policy.allows("/admin/business/overall", Role::Customer));
    let rule = policy.rule_for("/admin/users").expect("admin rule");
    assert_eq!(rule.denial, "Admin access required");

    // General API paths take either role.
    assert!(policy.allows("/api/cart", Role::Customer));
    assert!(policy.allows("/api/cart", Role::Admin));

    // Paths outside every prefix are not guarded.
    assert!(policy.rule_for("/docs").is_none());
}

#[test]
fn policy_public_paths_are_exact_matches() {
    let policy = RoutePolicy::default();

    assert!(policy.is_public("/api/auth/login"));
    assert!(policy.is_public("/api/auth/register"));
    assert!(policy.is_public("/health"));

    assert!(!policy.is_public("/api/auth/logout"));
    assert!(!policy.is_public("/api/auth/login/extra"));
}

#[test]
fn tokens_round_trip_and_fail_closed() {
    let tokens = TokenService::new("test-secret", 3600);

    let issued = tokens.issue("alice").expect("issue token");
    assert!(tokens.validate(&issued.value));
    assert_eq!(tokens.extract_username(&issued.value).as_deref(), Some("alice"));

    // Garbage and wrong-key tokens are rejected, never an error.
    assert!(!tokens.validate("not-a-token"));
    let other = TokenService::new("other-secret", 3600);
    assert!(!other.validate(&issued.value));
}

#[test]
fn expired_tokens_are_rejected() {
    // Negative TTL beyond the validation leeway.
    let tokens = TokenService::new("test-secret", -120);
    let issued = tokens.issue("bob").expect("issue token");
    assert!(!tokens.validate(&issued.value));
}

fn test_gateway(secret: &str) -> PaymentGateway {
    PaymentGateway::new(&GatewayConfig {
        key_id: "key".to_string(),
        key_secret: secret.to_string(),
        base_url: "http://localhost:0".to_string(),
        currency: "INR".to_string(),
    })
}

fn sign(secret: &str, order_id: &str, payment_id: &str) -> String {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
    mac.update(format!("{order_id}|{payment_id}").as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[test]
fn gateway_signature_verification() {
    let gateway = test_gateway("gw-secret");
    let signature = sign("gw-secret", "order_1", "pay_1");

    assert!(gateway.verify_signature("order_1", "pay_1", &signature));

    // Any tampering with the signed fields breaks verification.
    assert!(!gateway.verify_signature("order_2", "pay_1", &signature));
    assert!(!gateway.verify_signature("order_1", "pay_2", &signature));

    // A signature under a different secret is rejected.
    let forged = sign("wrong-secret", "order_1", "pay_1");
    assert!(!gateway.verify_signature("order_1", "pay_1", &forged));

    // Fails closed on undecodable input.
    assert!(!gateway.verify_signature("order_1", "pay_1", "zz-not-hex"));
}
