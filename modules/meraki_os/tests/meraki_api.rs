use std::sync::Arc;

use console_kit::{
    ApiError, ListStatus, Navigator, Notification, Notifier, Session, TracedClient,
};
use httpmock::prelude::*;
use meraki_os::{
    lookups, open_for_edit, screens, AuthApi, ClienteDto, Item, MerakiApi, TipoPessoa,
};
use parking_lot::Mutex;
use serde_json::json;
use url::Url;
use uuid::Uuid;

fn api_for(server: &MockServer, session: Session) -> MerakiApi {
    let base = Url::parse(&server.base_url()).unwrap();
    MerakiApi::new(TracedClient::new(reqwest::Client::new(), session), base)
}

fn recorder() -> (Arc<dyn Notifier>, Arc<Mutex<Vec<Notification>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    (Arc::new(move |n: Notification| sink.lock().push(n)), seen)
}

fn item_json(id: Uuid, descricao: &str) -> serde_json::Value {
    json!({
        "id": id,
        "identificacao": 7,
        "descricao": descricao,
        "preco": 1.5,
        "idUnidade": null,
        "ativo": true
    })
}

#[tokio::test]
async fn clientes_screen_mounts_against_nested_path() {
    let server = MockServer::start_async().await;
    let id = Uuid::new_v4();
    let m = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/Cadastros/Cliente")
                .query_param("pageNumber", "1")
                .query_param("pageSize", "10");
            then.status(200).json_body(json!({
                "items": [{ "id": id, "nome": "Ana", "tipoPessoa": 0, "cpf": "123" }],
                "totalCount": 1,
                "pageNumber": 1,
                "pageSize": 10,
                "totalPages": 1
            }));
        })
        .await;

    let api = api_for(&server, Session::new());
    let (notifier, seen) = recorder();
    let ctl = screens::clientes().mount(&api, notifier);

    let state = ctl.settled().await;
    assert_eq!(state.status, ListStatus::Ready);
    assert_eq!(state.items.len(), 1);
    assert_eq!(state.items[0].nome, "Ana");
    assert_eq!(state.items[0].tipo_pessoa, TipoPessoa::Fisica);
    assert!(seen.lock().is_empty());
    m.assert_async().await;
}

#[tokio::test]
async fn failed_list_notifies_screen_text() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/Item");
            then.status(500).body("");
        })
        .await;

    let api = api_for(&server, Session::new());
    let (notifier, seen) = recorder();
    let ctl = screens::itens().mount(&api, notifier);

    let state = ctl.settled().await;
    assert_eq!(state.status, ListStatus::Failed);
    assert_eq!(state.error.as_deref(), Some("Erro ao listar itens."));
    let seen = seen.lock();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].description, "Não foi possível carregar os Itens.");
}

#[tokio::test]
async fn status_filter_becomes_search_pair() {
    let server = MockServer::start_async().await;
    let filtered = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/Servico")
                .query_param("searchBy", "Ativo")
                .query_param("searchTerm", "0");
            then.status(200).json_body(json!({ "items": [], "totalCount": 0 }));
        })
        .await;

    let api = api_for(&server, Session::new());
    let (notifier, _) = recorder();
    let screen = screens::servicos();
    let ctl = screen.mount(&api, notifier);
    ctl.settled().await;

    screen.search(&ctl, "Descricao", "", Some("0")).await.unwrap();
    assert_eq!(ctl.state().status, ListStatus::Ready);
    assert_eq!(filtered.calls_async().await, 1);
}

#[tokio::test]
async fn stock_list_is_narrowed_by_item_filter() {
    let server = MockServer::start_async().await;
    let item = Uuid::new_v4();
    let narrowed = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/Estoque")
                .query_param("filters", format!("IdItem:{item}"));
            then.status(200).json_body(json!({
                "items": [{ "id": Uuid::new_v4(), "saldo": 4.0, "precoTotal": 6.0, "item": item_json(item, "Parafuso") }],
                "totalCount": 1,
                "totalPages": 1
            }));
        })
        .await;

    let api = api_for(&server, Session::new());
    let (notifier, _) = recorder();
    let ctl = screens::estoques().mount(&api, notifier);
    ctl.settled().await;

    let picked: Item = serde_json::from_value(item_json(item, "Parafuso")).unwrap();
    screens::filter_by_item(&ctl, Some(&picked)).await.unwrap();
    let state = ctl.state();
    assert_eq!(state.items.len(), 1);
    assert_eq!(state.items[0].item.descricao, "Parafuso");
    assert_eq!(narrowed.calls_async().await, 1);
}

#[tokio::test]
async fn open_for_edit_navigates_on_success() {
    let server = MockServer::start_async().await;
    let id = Uuid::new_v4();
    server
        .mock_async(|when, then| {
            when.method(GET).path(format!("/Item/{id}"));
            then.status(200).json_body(item_json(id, "Arruela"));
        })
        .await;

    let api = api_for(&server, Session::new());
    let routes = Arc::new(Mutex::new(Vec::<String>::new()));
    let sink = routes.clone();
    let navigator = move |route: &str| sink.lock().push(route.to_string());
    let (notifier, seen) = recorder();

    let item = open_for_edit(&*api.itens, id, &navigator as &dyn Navigator, notifier.as_ref()).await;

    assert_eq!(item.map(|i| i.descricao), Some("Arruela".to_string()));
    assert_eq!(routes.lock().as_slice(), [format!("/alterar/item/{id}")]);
    assert!(seen.lock().is_empty());
}

#[tokio::test]
async fn open_for_edit_notifies_and_stays_on_failure() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/Estoque/missing");
            then.status(404).json_body(json!({ "Message": "Estoque não encontrado" }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/Cadastros/Cliente/broken");
            then.status(500);
        })
        .await;

    let api = api_for(&server, Session::new());
    let routes = Arc::new(Mutex::new(Vec::<String>::new()));
    let sink = routes.clone();
    let navigator = move |route: &str| sink.lock().push(route.to_string());
    let (notifier, seen) = recorder();

    let found = open_for_edit(&*api.estoques, "missing", &navigator as &dyn Navigator, notifier.as_ref()).await;
    assert!(found.is_none());
    let found = open_for_edit(&*api.clientes, "broken", &navigator as &dyn Navigator, notifier.as_ref()).await;
    assert!(found.is_none());

    assert!(routes.lock().is_empty());
    let seen = seen.lock();
    assert_eq!(seen[0].description, "Estoque não encontrado");
    assert_eq!(seen[1].description, "Erro ao buscar cliente.");
}

#[tokio::test]
async fn invalid_cliente_is_rejected_before_sending() {
    let server = MockServer::start_async().await;
    let m = server
        .mock_async(|when, then| {
            when.method(POST).path("/Cadastros/Cliente");
            then.status(201);
        })
        .await;

    let api = api_for(&server, Session::new());
    let err = api
        .clientes
        .inserir(&ClienteDto {
            nome: "Jo".into(),
            ..Default::default()
        })
        .await
        .unwrap_err();

    match err {
        ApiError::Validation(errors) => {
            assert_eq!(errors.field("nome"), Some("Nome deve ter no mínimo 3 caracteres"));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(m.calls_async().await, 0);
}

#[tokio::test]
async fn login_stores_token_used_by_later_calls() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/auth/login")
                .json_body(json!({ "email": "ana@meraki.dev", "password": "s3cret" }));
            then.status(200).json_body(json!({
                "token": "jwt-1",
                "user": { "id": "u1", "nome": "Ana", "email": "ana@meraki.dev" }
            }));
        })
        .await;
    let toggled = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/Item/AtivarInativar/42")
                .header("authorization", "Bearer jwt-1");
            then.status(200);
        })
        .await;

    let api = api_for(&server, Session::new());
    let auth = AuthApi::for_api(&api);
    assert!(!auth.is_authenticated());

    let resp = auth.login("ana@meraki.dev", "s3cret").await.unwrap();
    assert_eq!(resp.token, "jwt-1");
    assert!(auth.is_authenticated());
    assert_eq!(auth.current_user().map(|u| u.nome), Some("Ana".to_string()));

    api.itens.ativar_inativar(42).await.unwrap();
    toggled.assert_async().await;

    auth.logout();
    assert!(!api.session().is_authenticated());
}

#[tokio::test]
async fn auth_failures_use_server_message_or_fixed_text() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/auth/login");
            then.status(401);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/auth/register");
            then.status(409).json_body(json!({ "message": "Email já cadastrado" }));
        })
        .await;

    let api = api_for(&server, Session::new());
    let auth = AuthApi::for_api(&api);

    let err = auth.login("ana@meraki.dev", "wrong").await.unwrap_err();
    assert_eq!(err, ApiError::http(401, "Credenciais inválidas"));

    let err = auth.register("Ana", "ana@meraki.dev", "x").await.unwrap_err();
    assert_eq!(err.user_message(), "Email já cadastrado");
    assert!(!auth.is_authenticated());

    let err = auth.login("not-an-email", "x").await.unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
}

#[tokio::test]
async fn lookups_query_their_field_in_their_style() {
    let server = MockServer::start_async().await;
    let units = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/Unidade")
                .query_param("searchBy", "sigla")
                .query_param("searchTerm", "K")
                .query_param("sortBy", "sigla")
                .query_param("pageSize", "5");
            then.status(200).json_body(json!({
                "items": [{ "id": Uuid::new_v4(), "sigla": "KG", "descricao": "Quilograma" }],
                "totalCount": 1,
                "totalPages": 1
            }));
        })
        .await;
    let items = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/Item")
                .query_param("filters", "descricao:para")
                .query_param("sortBy", "descricao")
                .query_param("pageNumber", "2");
            then.status(200).json_body(json!({ "items": [], "totalCount": 0 }));
        })
        .await;

    let api = api_for(&server, Session::new());
    let page = lookups::unidades(&api, 5).search("K", 1).await.unwrap();
    assert_eq!(page.items[0].sigla, "KG");
    assert!(page.items[0].ativo);

    let page = lookups::itens(&api, 10).search("para", 2).await.unwrap();
    assert!(page.items.is_empty());

    units.assert_async().await;
    items.assert_async().await;
}
