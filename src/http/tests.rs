use std::time::Duration;

use http::{HeaderMap, Method};

use crate::error::{AppError, AppResult};
use crate::result::{ErrorKind, ResolvedRequest};
use crate::test_support::{run_async_test, spawn_canned_server, spawn_silent_server};

use super::{HttpSettings, Invoker, ReqwestInvoker};

fn get(url: &str) -> ResolvedRequest {
    ResolvedRequest {
        method: Method::GET,
        url: url.to_owned(),
        headers: HeaderMap::new(),
        body: None,
    }
}

fn quick_settings() -> HttpSettings {
    HttpSettings {
        connect_timeout: Duration::from_millis(500),
        request_timeout: Duration::from_millis(300),
        acquire_timeout: Duration::from_millis(100),
        ..HttpSettings::default()
    }
}

#[test]
fn defaults_mirror_pool_limits() -> AppResult<()> {
    let settings = HttpSettings::default();
    if settings.max_connections != 500
        || settings.max_idle_per_host != 100
        || settings.connect_timeout != Duration::from_secs(5)
        || settings.request_timeout != Duration::from_secs(10)
        || settings.acquire_timeout != Duration::from_secs(3)
        || settings.raise_for_status
    {
        return Err(AppError::from(format!("unexpected defaults {:?}", settings)));
    }
    Ok(())
}

#[test]
fn server_errors_are_responses_by_default() -> AppResult<()> {
    run_async_test(async {
        let url = spawn_canned_server("503 Service Unavailable", r#"{"ok":false}"#).await?;
        let invoker = ReqwestInvoker::from_settings(&quick_settings())?;
        let response = invoker
            .invoke(&get(&url))
            .await
            .map_err(|err| AppError::from(err.to_string()))?;
        if response.status != 503 || response.body != r#"{"ok":false}"# {
            return Err(AppError::from(format!("unexpected response {:?}", response)));
        }
        Ok(())
    })
}

#[test]
fn raise_for_status_classifies_error_codes() -> AppResult<()> {
    run_async_test(async {
        let settings = HttpSettings {
            raise_for_status: true,
            ..quick_settings()
        };
        let invoker = ReqwestInvoker::from_settings(&settings)?;

        let server = spawn_canned_server("500 Internal Server Error", "{}").await?;
        match invoker.invoke(&get(&server)).await {
            Err(err) if err.kind == ErrorKind::HttpServer && err.status == Some(500) => {}
            other => return Err(AppError::from(format!("expected server error, got {:?}", other))),
        }

        let client = spawn_canned_server("404 Not Found", "{}").await?;
        match invoker.invoke(&get(&client)).await {
            Err(err) if err.kind == ErrorKind::HttpClient && err.status == Some(404) => {}
            other => return Err(AppError::from(format!("expected client error, got {:?}", other))),
        }

        let ok = spawn_canned_server("200 OK", "{}").await?;
        if invoker.invoke(&get(&ok)).await.is_err() {
            return Err("2xx must stay a response".into());
        }
        Ok(())
    })
}

#[test]
fn unparseable_url_is_unknown_error() -> AppResult<()> {
    run_async_test(async {
        let invoker = ReqwestInvoker::from_settings(&quick_settings())?;
        match invoker.invoke(&get("not a url")).await {
            Err(err) if err.kind == ErrorKind::Unknown => Ok(()),
            other => Err(AppError::from(format!("expected unknown error, got {:?}", other))),
        }
    })
}

#[test]
fn unanswered_request_is_connection_error() -> AppResult<()> {
    run_async_test(async {
        let url = spawn_silent_server().await?;
        let invoker = ReqwestInvoker::from_settings(&quick_settings())?;
        match invoker.invoke(&get(&url)).await {
            Err(err) if err.kind == ErrorKind::Connection => Ok(()),
            other => Err(AppError::from(format!("expected connection error, got {:?}", other))),
        }
    })
}

#[test]
fn exhausted_pool_times_out_as_connection_error() -> AppResult<()> {
    run_async_test(async {
        let url = spawn_silent_server().await?;
        let settings = HttpSettings {
            max_connections: 1,
            request_timeout: Duration::from_secs(2),
            acquire_timeout: Duration::from_millis(50),
            ..quick_settings()
        };
        let invoker = ReqwestInvoker::from_settings(&settings)?;
        let request = get(&url);
        let (first, second) = tokio::join!(invoker.invoke(&request), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            invoker.invoke(&request).await
        });
        match second {
            Err(err) if err.kind == ErrorKind::Connection && err.message.contains("No connection") => {}
            other => return Err(AppError::from(format!("expected pool timeout, got {:?}", other))),
        }
        if first.is_ok() {
            return Err("silent server cannot answer".into());
        }
        Ok(())
    })
}
