#![allow(clippy::unwrap_used)]
// Integration tests for `TableClient` using wiremock.

use secrecy::SecretString;
use serde_json::{Map, json};
use url::Url;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cajeros_api::{AssignmentRecord, Error, LineStatus, TableClient, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, TableClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = TableClient::new(
        base_url,
        SecretString::from("anon-key"),
        &TransportConfig::default(),
    )
    .unwrap();
    (server, client)
}

// ── Headers & errors ────────────────────────────────────────────────

#[tokio::test]
async fn test_requests_carry_api_key_headers() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/cajeros"))
        .and(header("apikey", "anon-key"))
        .and(header("authorization", "Bearer anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client.list_cajeros().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_postgrest_error_message_surfaces() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/cajeros"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23505",
            "details": null,
            "hint": null,
            "message": "duplicate key value violates unique constraint"
        })))
        .mount(&server)
        .await;

    let err = client.insert_cajero(Map::new()).await.unwrap_err();
    assert!(
        matches!(err, Error::Http { status: 409, ref message } if message.starts_with("duplicate key")),
        "got {err:?}"
    );
}

// ── Devices ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_cajeros_by_ids_uses_in_filter() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/cajeros"))
        .and(query_param("id", "in.(3,8)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 3, "nombre": "Caja 3", "estadolinea": "open", "conteodia": 2 },
            { "id": 8, "nombre": "Caja 8", "estadolinea": "close" }
        ])))
        .mount(&server)
        .await;

    let rows = client.list_cajeros_by_ids(&[3, 8]).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].estadolinea, Some(LineStatus::Text("open".into())));
    assert_eq!(rows[0].conteodia, Some(2));
}

#[tokio::test]
async fn test_list_cajeros_by_empty_ids_sends_nothing() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    assert!(client.list_cajeros_by_ids(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_insert_cajero_returns_representation() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/cajeros"))
        .and(header("prefer", "return=representation"))
        .and(body_json(json!({ "nombre": "Caja 9", "estadolinea": "close", "conteo": 0, "conteodia": 0 })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            { "id": 9, "nombre": "Caja 9", "estadolinea": "close", "conteo": 0, "conteodia": 0 }
        ])))
        .mount(&server)
        .await;

    let mut fields = Map::new();
    fields.insert("nombre".into(), json!("Caja 9"));
    fields.insert("estadolinea".into(), json!("close"));
    fields.insert("conteo".into(), json!(0));
    fields.insert("conteodia".into(), json!(0));

    let row = client.insert_cajero(fields).await.unwrap();
    assert_eq!(row.id, Some(9));
}

#[tokio::test]
async fn test_update_cajero_patches_by_id() {
    let (server, client) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/cajeros"))
        .and(query_param("id", "eq.2"))
        .and(body_json(json!({ "estadolinea": "open" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 2, "estadolinea": "open" }])))
        .expect(1)
        .mount(&server)
        .await;

    let mut fields = Map::new();
    fields.insert("estadolinea".into(), json!("open"));
    client.update_cajero(2, fields).await.unwrap();
}

// ── Administrators ──────────────────────────────────────────────────

#[tokio::test]
async fn test_sign_in_matches_name_and_password() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/administradores"))
        .and(query_param("nombre", "eq.ana"))
        .and(query_param("contrasena", "eq.pw"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 7, "nombre": "ana", "contrasena": "pw", "permisoAdmin": true }
        ])))
        .mount(&server)
        .await;

    let admin = client.sign_in("ana", &SecretString::from("pw")).await.unwrap();
    assert_eq!(admin.id, 7);
}

#[tokio::test]
async fn test_sign_in_no_rows_is_failure() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/administradores"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let err = client
        .sign_in("ana", &SecretString::from("bad"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Backend { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_admin_id_by_name_selects_id() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/administradores"))
        .and(query_param("nombre", "eq.ops"))
        .and(query_param("select", "id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 2 }])))
        .mount(&server)
        .await;

    assert_eq!(client.admin_id_by_name("ops").await.unwrap(), Some(2));
}

// ── Macro ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_macro_always_targets_row_one() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/macros"))
        .and(query_param("id", "eq.1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "cbu90%": "X", "cbu100%": "Y" }
        ])))
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/macros"))
        .and(query_param("id", "eq.1"))
        .and(body_json(json!({ "cbu100%": "Z" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let m = client.get_macro().await.unwrap().unwrap();
    assert_eq!(m.cbu90.as_deref(), Some("X"));
    client.update_macro(None, Some("Z")).await.unwrap();
}

#[tokio::test]
async fn test_missing_macro_row_is_none() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/macros"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    assert!(client.get_macro().await.unwrap().is_none());
}

// ── Assignments ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_assignment_round() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/administrador_cajero"))
        .and(query_param("id_administrador", "eq.7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id_administrador": 7, "id_cajero": 3 },
            { "id_administrador": 7, "id_cajero": 8 }
        ])))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/administrador_cajero"))
        .and(query_param("id_administrador", "eq.7"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/administrador_cajero"))
        .and(body_json(json!([{ "id_administrador": 7, "id_cajero": 5 }])))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(client.assigned_cajero_ids(7).await.unwrap(), vec![3, 8]);
    client.delete_assignments(7).await.unwrap();
    client
        .insert_assignments(&[AssignmentRecord { id_administrador: 7, id_cajero: 5 }])
        .await
        .unwrap();
}
