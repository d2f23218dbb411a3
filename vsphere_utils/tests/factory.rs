/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

mod common;

use common::{vim_handler, Response, Server, INVALID_LOGIN, LOGIN, SESSION_ID};
use vsphere_utils::{
    AuthenticationError, EsxiClientFactory, Error, VcenterClientFactory,
};

const API_SESSION_ID: &str = "b00b7f1b3c5e4b1f9c7dd1f0a3b1c2d4";

async fn vcenter_server(api_version: &'static str) -> Server {
    Server::start(move |req| match (req.method.as_str(), req.path.as_str()) {
        ("POST", "/sdk") => vim_handler(api_version, req),
        ("POST", "/api/session") => {
            Response::status(201, &format!("\"{}\"", API_SESSION_ID))
        }
        ("DELETE", "/api/session") => Response::status(204, ""),
        _ => Response::status(404, ""),
    })
    .await
}

#[tokio::test]
async fn unified_session_on_803() {
    let server = vcenter_server("8.0.3.0").await;
    let factory = VcenterClientFactory::new(server.config()).await.unwrap();
    let client = factory
        .create_client("administrator@vsphere.local", "secret", None)
        .await
        .unwrap();

    assert_eq!(client.session_id().as_str(), SESSION_ID);
    assert_eq!(client.api_session_id(), client.session_id());
    assert!(server.requests().iter().all(|req| req.path == "/sdk"));
    assert_eq!(
        server.soap_calls(),
        vec!["RetrieveServiceContent", "Login", "RetrieveServiceContent"]
    );

    client.close().await;
    assert_eq!(server.soap_calls().last().map(String::as_str), Some("Logout"));
    assert!(server.requests().iter().all(|req| req.method == "POST"));
}

#[tokio::test]
async fn dual_session_before_803() {
    let server = vcenter_server("7.0.3.0").await;
    let factory = VcenterClientFactory::new(server.config()).await.unwrap();
    let client = factory
        .create_client("administrator@vsphere.local", "secret", Some("en"))
        .await
        .unwrap();

    assert_eq!(client.session_id().as_str(), SESSION_ID);
    assert_eq!(client.api_session_id().as_str(), API_SESSION_ID);
    let create = server
        .requests()
        .into_iter()
        .find(|req| req.path == "/api/session")
        .unwrap();
    assert_eq!(create.method, "POST");
    assert!(create
        .header("authorization")
        .is_some_and(|auth| auth.starts_with("Basic ")));

    client.close().await;
    let requests = server.requests();
    let delete = requests
        .iter()
        .find(|req| req.method == "DELETE")
        .unwrap();
    assert_eq!(delete.path, "/api/session");
    assert_eq!(delete.header("vmware-api-session-id"), Some(API_SESSION_ID));
    assert_eq!(server.soap_calls().last().map(String::as_str), Some("Logout"));
}

#[tokio::test]
async fn session_cookie_is_replayed() {
    let server = vcenter_server("8.0.3.0").await;
    let factory = VcenterClientFactory::new(server.config()).await.unwrap();
    let client = factory.create_client("user", "secret", None).await.unwrap();

    let requests = server.requests();
    assert_eq!(requests[0].header("cookie"), None);
    assert_eq!(requests[1].header("cookie"), None);
    assert_eq!(
        requests[2].header("cookie"),
        Some(format!("vmware_soap_session=\"{}\"", SESSION_ID).as_str())
    );
    assert!(requests[1].body.contains("<ns1:userName>user</ns1:userName>"));
    assert!(!requests[1].body.contains("<ns1:locale>"));

    client.close().await;
}

#[tokio::test]
async fn service_content_is_memoized() {
    let server = vcenter_server("8.0.3.0").await;
    let factory = VcenterClientFactory::new(server.config()).await.unwrap();
    let client = factory.create_client("user", "secret", None).await.unwrap();
    let before = server.requests().len();

    let content = client.service_content().await.unwrap();
    assert_eq!(content.about.api_version, "8.0.3.0");
    assert_eq!(content.root_folder.value, "group-d1");
    client.service_content().await.unwrap();
    client.property_collector().await.unwrap();

    assert_eq!(server.requests().len(), before);
    client.close().await;
}

#[tokio::test]
async fn missing_session_cookie() {
    let server = Server::start(|req| match req.soap_method() {
        Some("Login") => Response::ok(LOGIN),
        _ => vim_handler("8.0.3.0", req),
    })
    .await;
    let factory = VcenterClientFactory::new(server.config()).await.unwrap();

    let res = factory.create_client("user", "secret", None).await;
    assert!(matches!(
        res,
        Err(Error::Authentication(
            AuthenticationError::MissingSessionCookie(_)
        ))
    ));
    assert_eq!(server.soap_calls(), vec!["RetrieveServiceContent", "Login"]);
}

#[tokio::test]
async fn rejected_login() {
    let server = Server::start(|req| match req.soap_method() {
        Some("Login") => Response::status(500, INVALID_LOGIN),
        _ => vim_handler("8.0.3.0", req),
    })
    .await;
    let factory = VcenterClientFactory::new(server.config()).await.unwrap();

    let err = factory
        .create_client("user", "wrong", None)
        .await
        .err()
        .unwrap();
    assert!(matches!(
        err,
        Error::Authentication(AuthenticationError::Login(_))
    ));
    assert!(err.fault().is_some_and(|fault| fault.is("InvalidLogin")));
}

#[tokio::test]
async fn malformed_version_logs_out() {
    let server = vcenter_server("eight.0.3").await;
    let factory = VcenterClientFactory::new(server.config()).await.unwrap();

    let res = factory.create_client("user", "secret", None).await;
    assert!(matches!(res, Err(Error::Version(_))));
    assert_eq!(server.soap_calls().last().map(String::as_str), Some("Logout"));
}

#[tokio::test]
async fn failed_api_session_logs_out() {
    let server = Server::start(|req| match req.path.as_str() {
        "/api/session" => Response::status(401, "{}"),
        _ => vim_handler("7.0.3.0", req),
    })
    .await;
    let factory = VcenterClientFactory::new(server.config()).await.unwrap();

    let res = factory.create_client("user", "secret", None).await;
    assert!(matches!(
        res,
        Err(Error::Authentication(AuthenticationError::ApiSession(_)))
    ));
    assert_eq!(server.soap_calls().last().map(String::as_str), Some("Logout"));
}

#[tokio::test]
async fn esxi_single_session() {
    let server = Server::start(|req| vim_handler("7.0.3.0", req)).await;
    let factory = EsxiClientFactory::new(server.config()).await.unwrap();
    let client = factory.create_client("root", "secret", None).await.unwrap();

    assert_eq!(client.session_id().as_str(), SESSION_ID);
    assert_eq!(client.vsan_port().soap().endpoint(), {
        let port = server.config().port.unwrap();
        format!("http://127.0.0.1:{}/vsan", port)
    });

    client.close().await;
    assert_eq!(
        server.soap_calls(),
        vec![
            "RetrieveServiceContent",
            "Login",
            "RetrieveServiceContent",
            "Logout"
        ]
    );
}
