use std::marker::PhantomData;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use tracing::instrument;

use sa_core::ports::{GatewayError, ListQuery, ListResponse, RemoteGatewayPort};
use sa_core::{Entity, RecordId};

use super::HttpClient;

/// REST gateway for one collection, addressed by `T::COLLECTION`.
pub struct HttpGateway<T> {
    http: HttpClient,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> HttpGateway<T> {
    pub fn new(http: HttpClient) -> Self {
        Self {
            http,
            _entity: PhantomData,
        }
    }

    fn record_path(id: &RecordId) -> String {
        format!("{}/{}", T::COLLECTION, id)
    }
}

#[async_trait]
impl<T: Entity> RemoteGatewayPort<T> for HttpGateway<T> {
    #[instrument(name = "http.get_all", skip(self), fields(collection = T::COLLECTION))]
    async fn get_all(&self, query: &ListQuery) -> Result<ListResponse<T>, GatewayError> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(page) = query.page {
            params.push(("page", page.to_string()));
        }
        if let Some(limit) = query.limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(search) = &query.search {
            params.push(("search", search.clone()));
        }

        let request = self.http.request(Method::GET, T::COLLECTION).query(&params);
        let envelope = self.http.send::<Vec<T>>(request).await?;
        Ok(ListResponse {
            data: envelope.data.unwrap_or_default(),
            pagination: envelope.pagination,
        })
    }

    #[instrument(name = "http.create", skip(self, draft), fields(collection = T::COLLECTION))]
    async fn create(&self, draft: &T::Draft) -> Result<T, GatewayError> {
        let request = self.http.request(Method::POST, T::COLLECTION).json(draft);
        self.http.send_data(request).await
    }

    #[instrument(name = "http.update", skip(self, patch), fields(collection = T::COLLECTION))]
    async fn update(&self, id: &RecordId, patch: &T::Patch) -> Result<T, GatewayError> {
        let request = self
            .http
            .request(Method::PATCH, &Self::record_path(id))
            .json(patch);
        self.http.send_data(request).await
    }

    /// `Ok(false)` when the record does not exist on the server.
    #[instrument(name = "http.remove", skip(self), fields(collection = T::COLLECTION))]
    async fn remove(&self, id: &RecordId) -> Result<bool, GatewayError> {
        let request = self.http.request(Method::DELETE, &Self::record_path(id));
        match self.http.send::<serde_json::Value>(request).await {
            Ok(envelope) => Ok(envelope
                .data
                .and_then(|data| data.as_bool())
                .unwrap_or(true)),
            Err(GatewayError::Server {
                status: Some(status),
                ..
            }) if status == StatusCode::NOT_FOUND.as_u16() => Ok(false),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use sa_core::catalog::{Role, RoleDraft, RolePatch};
    use std::time::Duration;

    fn gateway(server: &Server) -> HttpGateway<Role> {
        HttpGateway::new(HttpClient::new(server.url(), Duration::from_secs(5)).unwrap())
    }

    const ADMIN: &str = r#"{
        "id": "r1", "title": "Admin", "routes": ["/"],
        "createdAt": "2024-01-01T00:00:00Z", "updatedAt": "2024-01-01T00:00:00Z"
    }"#;

    #[tokio::test]
    async fn get_all_sends_paging_params_and_reads_pagination() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/roles")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("page".into(), "2".into()),
                Matcher::UrlEncoded("limit".into(), "10".into()),
                Matcher::UrlEncoded("search".into(), "adm".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(
                r#"{{"success":true,"data":[{ADMIN}],"pagination":{{"page":2,"limit":10,"total":11,"totalPages":2}}}}"#
            ))
            .create_async()
            .await;

        let response = gateway(&server)
            .get_all(&ListQuery::page(2, 10).with_search("adm"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.data.len(), 1);
        assert_eq!(response.data[0].title, "Admin");
        assert_eq!(response.pagination.map(|p| p.total), Some(11));
    }

    #[tokio::test]
    async fn create_posts_the_draft() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/roles")
            .match_body(Matcher::PartialJson(serde_json::json!({ "title": "Admin" })))
            .with_status(201)
            .with_body(format!(r#"{{"success":true,"data":{ADMIN}}}"#))
            .create_async()
            .await;

        let created = gateway(&server)
            .create(&RoleDraft {
                title: "Admin".into(),
                routes: vec!["/".into()],
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(created.id, RecordId::from("r1"));
    }

    #[tokio::test]
    async fn unsuccessful_envelope_is_a_server_error() {
        let mut server = Server::new_async().await;
        server
            .mock("PATCH", "/roles/r1")
            .with_status(200)
            .with_body(r#"{"success":false,"error":"title already used"}"#)
            .create_async()
            .await;

        let err = gateway(&server)
            .update(
                &RecordId::from("r1"),
                &RolePatch {
                    title: Some("Staff".into()),
                    routes: None,
                },
            )
            .await
            .unwrap_err();

        assert_eq!(
            err,
            GatewayError::Server {
                status: Some(200),
                message: "title already used".into()
            }
        );
    }

    #[tokio::test]
    async fn garbage_body_is_a_decode_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/roles")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let err = gateway(&server).get_all(&ListQuery::all()).await.unwrap_err();
        assert!(matches!(err, GatewayError::Decode(_)));
    }

    #[tokio::test]
    async fn remove_reports_missing_records_as_false() {
        let mut server = Server::new_async().await;
        server
            .mock("DELETE", "/roles/r1")
            .with_status(200)
            .with_body(r#"{"success":true}"#)
            .create_async()
            .await;
        server
            .mock("DELETE", "/roles/gone")
            .with_status(404)
            .with_body(r#"{"success":false,"error":"not found"}"#)
            .create_async()
            .await;

        let gateway = gateway(&server);
        assert!(gateway.remove(&RecordId::from("r1")).await.unwrap());
        assert!(!gateway.remove(&RecordId::from("gone")).await.unwrap());
    }

    #[tokio::test]
    async fn unreachable_server_is_a_network_error() {
        let http = HttpClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = HttpGateway::<Role>::new(http)
            .get_all(&ListQuery::all())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Network(_) | GatewayError::Timeout { .. }
        ));
    }
}
