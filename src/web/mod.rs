//! HTTP front end.
//!
//! Requests are forwarded to the `UpdateManager` pool; handlers never
//! block on the supervisor or on the filesystem themselves.

mod api;

pub(crate) use api::StatusReply;

use crate::config::Settings;
use crate::update::{UpdateLauncher, UpdateManager, MANAGER_THREADS};
use actix::Addr;
use actix_web::{http, middleware, server, App};
use failure::{Fallible, ResultExt};
use std::sync::Arc;

/// Update management endpoint.
static UPDATE_PATH: &str = "/api/update";

/// Shared state for HTTP handlers.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) manager: Addr<UpdateManager>,
}

fn build_app(state: AppState) -> App<AppState> {
    App::with_state(state)
        .middleware(middleware::Logger::default())
        .resource(UPDATE_PATH, |r| {
            r.method(http::Method::GET).f(api::get_update);
            r.method(http::Method::PUT).f(api::put_update);
            r.method(http::Method::POST).f(api::put_update);
        })
}

/// Run the HTTP server until the system is stopped.
pub(crate) fn serve(cfg: &Settings) -> Fallible<()> {
    let sys = actix::System::new("dells2725hs-web");

    let launcher = Arc::new(UpdateLauncher::from_settings(cfg));
    let oracle = launcher.oracle();
    info!(
        "supervising updater '{}', results recorded at {}",
        oracle.service(),
        oracle.store().path().display()
    );
    match launcher.status() {
        Ok(status) => info!("current update status: {}", status.label()),
        Err(e) => warn!("unable to determine update status: {}", e),
    }

    let manager = UpdateManager::start_pool(launcher, MANAGER_THREADS);
    let state = AppState { manager };

    server::new(move || build_app(state.clone()))
        .workers(cfg.server.workers)
        .bind(cfg.server.listen_address)
        .context(format!("failed to bind to {}", cfg.server.listen_address))?
        .start();
    info!("listening on {}", cfg.server.listen_address);

    sys.run();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::supervisor::testing::FakeSupervisor;
    use crate::update::{ResultStore, StatusOracle, UpdateResult};
    use actix_web::http::{Method, StatusCode};
    use actix_web::{test, HttpMessage};
    use serde_json::Value;

    fn call(srv: &mut test::TestServer, method: Method) -> (StatusCode, Value) {
        let request = srv.client(method, UPDATE_PATH).finish().unwrap();
        let response = srv.execute(request.send()).unwrap();
        let status = response.status();
        let body = srv.execute(response.body()).unwrap();
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, json)
    }

    #[test]
    fn update_routes() {
        let dir = tempfile::tempdir().unwrap();
        let sup = Arc::new(FakeSupervisor::default());
        let store = ResultStore::new(dir.path().join("result.json"));
        let oracle = StatusOracle::new("dells2725hs-updater".to_string(), sup.clone(), store);
        let launcher = Arc::new(UpdateLauncher::new(oracle));

        let factory_launcher = launcher.clone();
        let mut srv = test::TestServer::with_factory(move || {
            let manager = UpdateManager::start_pool(factory_launcher.clone(), 1);
            build_app(AppState { manager })
        });

        let (status, body) = call(&mut srv, Method::GET);
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "idle");
        assert!(body["result"].is_null());

        let (status, body) = call(&mut srv, Method::PUT);
        assert_eq!(status, StatusCode::ACCEPTED);
        assert!(body.is_null());
        assert_eq!(sup.start_requests(), 1);

        let (status, body) = call(&mut srv, Method::GET);
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "in_progress");
        assert!(body["result"].is_null());

        for method in vec![Method::PUT, Method::POST] {
            let (status, body) = call(&mut srv, method);
            assert_eq!(status, StatusCode::CONFLICT);
            assert_eq!(body["error"], "already_in_progress");
            assert!(body["message"].is_string());
        }
        assert_eq!(sup.start_requests(), 1);

        // Updater exits after recording its outcome.
        let store = launcher.oracle().store();
        store.write(&UpdateResult::failure("checksum mismatch")).unwrap();
        sup.set_running(false);

        let (status, body) = call(&mut srv, Method::GET);
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "completed");
        assert_eq!(body["result"]["outcome"], "failure");
        assert_eq!(body["result"]["diagnostic"], "checksum mismatch");

        let (status, _) = call(&mut srv, Method::POST);
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(sup.start_requests(), 2);
        assert_eq!(store.read().unwrap(), None);

        sup.set_running(false);
        sup.break_liveness();
        let (status, body) = call(&mut srv, Method::GET);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "supervisor");
    }
}
