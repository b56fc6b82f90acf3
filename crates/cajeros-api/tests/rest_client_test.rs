#![allow(clippy::unwrap_used)]
// Integration tests for `RestClient` using wiremock.

use secrecy::SecretString;
use serde_json::{Map, json};
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cajeros_api::{Error, LineStatus, RestClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, RestClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = RestClient::with_client(reqwest::Client::new(), base_url);
    (server, client)
}

// ── Authentication ──────────────────────────────────────────────────

#[tokio::test]
async fn test_sign_in_success() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/iniciar_sesion_administrador"))
        .and(body_json(json!({ "nombre": "ana", "contrasena": "pw" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "id": 7, "nombre": "ana", "contrasena": "pw", "permisoAdmin": true }
        })))
        .mount(&server)
        .await;

    let admin = client.sign_in("ana", &SecretString::from("pw")).await.unwrap();
    assert_eq!(admin.id, 7);
    assert_eq!(admin.permiso_admin, Some(true));
}

#[tokio::test]
async fn test_sign_in_rejected_carries_backend_message() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/iniciar_sesion_administrador"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "Credenciales incorrectas"
        })))
        .mount(&server)
        .await;

    let err = client
        .sign_in("ana", &SecretString::from("bad"))
        .await
        .unwrap_err();
    assert!(
        matches!(err, Error::Backend { ref message } if message == "Credenciales incorrectas"),
        "unexpected error: {err:?}"
    );
}

// ── Devices ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_cajeros_for_admin() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/obtener_cajeros_por_administrador"))
        .and(body_json(json!({ "id_administrador": 7 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [
                { "id": 3, "nombre": "Caja 3", "estadolinea": true, "conteoDia": 4 },
                { "id": 8, "nombre": "Caja 8", "estadolinea": false }
            ]
        })))
        .mount(&server)
        .await;

    let rows = client.list_cajeros_for_admin(7).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].estadolinea, Some(LineStatus::Flag(true)));
    assert_eq!(rows[0].conteo_dia, Some(4));
    assert_eq!(rows[1].nombre.as_deref(), Some("Caja 8"));
}

#[tokio::test]
async fn test_list_cajeros_null_data_is_empty() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/obtener_cajeros_por_administrador"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true, "data": null })))
        .mount(&server)
        .await;

    assert!(client.list_cajeros_for_admin(1).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_update_cajero_sends_id_and_fields() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/modificar_cajero_por_id"))
        .and(body_json(json!({ "id_cajero": 2, "estadolinea": true, "maxconteo": 50 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true, "message": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    let mut fields = Map::new();
    fields.insert("estadolinea".into(), json!(true));
    fields.insert("maxconteo".into(), json!(50));
    client.update_cajero(2, fields).await.unwrap();
}

#[tokio::test]
async fn test_http_error_uses_backend_message() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/modificar_cajero_por_id"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "error": "cajero no encontrado" })))
        .mount(&server)
        .await;

    let err = client.update_cajero(99, Map::new()).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.to_string(), "cajero no encontrado");
}

#[tokio::test]
async fn test_http_error_without_body_uses_status_line() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/obtener_todos_administradores"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let err = client.list_admins().await.unwrap_err();
    assert_eq!(err.to_string(), "HTTP error! status: 502");
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_unparseable_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/obtener_todos_administradores"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = client.list_admins().await.unwrap_err();
    assert!(matches!(err, Error::Deserialization { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_cajero_id_by_name() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/obtener_id_cajero_por_nombre"))
        .and(body_json(json!({ "nombre": "Caja 3" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true, "data": { "id": 3 } })))
        .mount(&server)
        .await;

    assert_eq!(client.cajero_id_by_name("Caja 3").await.unwrap(), Some(3));
}

// ── Administrators ──────────────────────────────────────────────────

#[tokio::test]
async fn test_list_admins_bare_array() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/obtener_todos_administradores"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "nombre": "root", "permisoAdmin": true },
            { "id": 2, "nombre": "ops", "permisoAdmin": false }
        ])))
        .mount(&server)
        .await;

    let admins = client.list_admins().await.unwrap();
    assert_eq!(admins.len(), 2);
    assert_eq!(admins[1].nombre, "ops");
}

#[tokio::test]
async fn test_update_admin_sends_id_admin() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/modificar_administrador_por_id"))
        .and(body_json(json!({ "id_admin": 4, "permisoAdmin": false })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    let mut fields = Map::new();
    fields.insert("permisoAdmin".into(), json!(false));
    client.update_admin(4, fields).await.unwrap();
}

#[tokio::test]
async fn test_admin_id_by_name_missing() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/obtener_id_administrador_por_nombre"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true, "data": null })))
        .mount(&server)
        .await;

    assert_eq!(client.admin_id_by_name("nadie").await.unwrap(), None);
}

// ── Macro ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_macro() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/obtener_cbus_macro"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "cbu90": "0001", "cbu100": "0002" }
        })))
        .mount(&server)
        .await;

    let m = client.get_macro().await.unwrap().unwrap();
    assert_eq!(m.cbu90.as_deref(), Some("0001"));
    assert_eq!(m.cbu100.as_deref(), Some("0002"));
}

#[tokio::test]
async fn test_get_macro_missing_is_none() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/obtener_cbus_macro"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": null
        })))
        .mount(&server)
        .await;

    assert!(client.get_macro().await.unwrap().is_none());
}

#[tokio::test]
async fn test_update_macro_body() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/modificar_cbus_macro"))
        .and(body_json(json!({ "cbu90_nuevo": "A", "cbu100_nuevo": "B" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    client.update_macro(Some("A"), Some("B")).await.unwrap();
}
