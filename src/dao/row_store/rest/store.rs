use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, header};
use serde_json::Value;

use crate::dao::{
    models::{ReadOptions, Row, RowId},
    row_store::RowStore,
    storage::{StorageError, StorageResult},
};

use super::{
    config::RestConfig,
    error::{RestDaoError, RestResult},
    payload::{error_marker, normalize_page, normalize_row},
};

const ROWS_API: &str = "api/database/rows/table";
const HEALTH_PATH: &str = "api/_health/";

/// Row store reached over the hosted database's REST API.
#[derive(Clone)]
pub struct RestRowStore {
    client: Client,
    base_url: Arc<str>,
    token: Option<Arc<str>>,
}

impl RestRowStore {
    /// Build the HTTP client. No request is sent until the first read.
    pub fn new(config: RestConfig) -> RestResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|source| RestDaoError::ClientBuilder { source })?;

        Ok(Self {
            client,
            base_url: Arc::<str>::from(config.base_url.trim_end_matches('/')),
            token: config.token.map(Arc::<str>::from),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path);
        let builder = self.client.request(method, url);
        match self.token {
            Some(ref token) => builder.header(header::AUTHORIZATION, format!("Token {token}")),
            None => builder,
        }
    }

    fn read(&self, path: &str, options: ReadOptions) -> RequestBuilder {
        let mut builder = self.request(Method::GET, path);
        if options.user_field_names {
            builder = builder.query(&[("user_field_names", "true")]);
        }
        if options.bypass_cache {
            builder = builder.header(header::CACHE_CONTROL, "no-cache");
        }
        builder
    }

    async fn send(&self, path: &str, builder: RequestBuilder) -> RestResult<Response> {
        builder
            .send()
            .await
            .map_err(|source| RestDaoError::RequestSend {
                path: path.to_string(),
                source,
            })
    }

    async fn json(&self, path: &str, response: Response) -> RestResult<Value> {
        response
            .json::<Value>()
            .await
            .map_err(|source| RestDaoError::DecodeResponse {
                path: path.to_string(),
                source,
            })
    }

    /// Map a non-success response to the marker it carries, or to its status.
    async fn failure(&self, path: &str, response: Response) -> RestDaoError {
        let status = response.status();
        match response.json::<Value>().await {
            Ok(body) => error_marker(path, &body).unwrap_or(RestDaoError::RequestStatus {
                path: path.to_string(),
                status,
            }),
            Err(_) => RestDaoError::RequestStatus {
                path: path.to_string(),
                status,
            },
        }
    }

    async fn list_page(
        &self,
        table: &str,
        page: u32,
        page_size: u32,
        options: ReadOptions,
    ) -> RestResult<Vec<Row>> {
        let path = format!("{ROWS_API}/{table}/");
        // The API numbers pages from 1.
        let query = [
            ("page", (u64::from(page) + 1).to_string()),
            ("size", page_size.to_string()),
        ];
        let response = self
            .send(&path, self.read(&path, options).query(&query))
            .await?;

        match response.status() {
            // Asking past the last page answers 404 rather than an empty list.
            StatusCode::NOT_FOUND => Ok(Vec::new()),
            status if status.is_success() => {
                let body = self.json(&path, response).await?;
                normalize_page(&path, body)
            }
            _ => Err(self.failure(&path, response).await),
        }
    }

    async fn fetch_row(
        &self,
        table: &str,
        id: RowId,
        options: ReadOptions,
    ) -> RestResult<Option<Row>> {
        let path = format!("{ROWS_API}/{table}/{id}/");
        let response = self.send(&path, self.read(&path, options)).await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let body = self.json(&path, response).await?;
                normalize_row(&path, body).map(Some)
            }
            _ => Err(self.failure(&path, response).await),
        }
    }

    async fn patch_row(&self, table: &str, id: RowId, patch: &Row) -> RestResult<Row> {
        let path = format!("{ROWS_API}/{table}/{id}/");
        let builder = self
            .request(Method::PATCH, &path)
            .query(&[("user_field_names", "true")])
            .json(patch);
        let response = self.send(&path, builder).await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(RestDaoError::RequestStatus {
                path,
                status: StatusCode::NOT_FOUND,
            }),
            status if status.is_success() => {
                let body = self.json(&path, response).await?;
                normalize_row(&path, body)
            }
            _ => Err(self.failure(&path, response).await),
        }
    }

    async fn ping(&self) -> RestResult<()> {
        let response = self
            .send(HEALTH_PATH, self.request(Method::GET, HEALTH_PATH))
            .await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(RestDaoError::RequestStatus {
                path: HEALTH_PATH.to_string(),
                status: response.status(),
            })
        }
    }
}

impl RowStore for RestRowStore {
    fn get_rows(
        &self,
        table: &str,
        page: u32,
        page_size: u32,
        options: ReadOptions,
    ) -> BoxFuture<'static, StorageResult<Vec<Row>>> {
        let store = self.clone();
        let table = table.to_string();
        Box::pin(async move {
            store
                .list_page(&table, page, page_size, options)
                .await
                .map_err(Into::into)
        })
    }

    fn get_row(
        &self,
        table: &str,
        id: RowId,
        options: ReadOptions,
    ) -> BoxFuture<'static, StorageResult<Option<Row>>> {
        let store = self.clone();
        let table = table.to_string();
        Box::pin(async move {
            store
                .fetch_row(&table, id, options)
                .await
                .map_err(Into::into)
        })
    }

    fn update_row(
        &self,
        table: &str,
        id: RowId,
        patch: Row,
    ) -> BoxFuture<'static, StorageResult<Row>> {
        let store = self.clone();
        let table = table.to_string();
        Box::pin(async move {
            match store.patch_row(&table, id, &patch).await {
                Ok(row) => Ok(row),
                Err(RestDaoError::RequestStatus {
                    status: StatusCode::NOT_FOUND,
                    ..
                }) => Err(StorageError::Missing { table, id }),
                Err(err) => Err(err.into()),
            }
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ping().await.map_err(Into::into) })
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        sync::{Arc, Mutex},
        time::Duration,
    };

    use axum::{
        Json, Router,
        extract::{Path, Query, State},
        http::HeaderMap,
        response::{IntoResponse, Response},
        routing::get,
    };
    use serde::Deserialize;
    use serde_json::json;
    use tokio::net::TcpListener;

    use crate::{
        dao::models::row_id,
        fetcher::{BulkCollectionFetcher, FetchOptions, RetryPolicy, StopReason},
    };

    use super::*;

    /// What the fake API saw for one list request.
    #[derive(Debug, Clone)]
    struct SeenRequest {
        table: String,
        page: u32,
        size: u32,
        user_field_names: Option<String>,
        cache_control: Option<String>,
        authorization: Option<String>,
    }

    /// Rows endpoint serving `seq`-numbered rows; pages past the end answer 404.
    #[derive(Default)]
    struct FakeApi {
        totals: HashMap<&'static str, u32>,
        seen: Mutex<Vec<SeenRequest>>,
    }

    #[derive(Deserialize)]
    struct PageQuery {
        page: u32,
        size: u32,
        user_field_names: Option<String>,
    }

    fn header_value(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    }

    async fn list_rows(
        State(api): State<Arc<FakeApi>>,
        Path(table): Path<String>,
        headers: HeaderMap,
        Query(query): Query<PageQuery>,
    ) -> Response {
        api.seen.lock().unwrap().push(SeenRequest {
            table: table.clone(),
            page: query.page,
            size: query.size,
            user_field_names: query.user_field_names,
            cache_control: header_value(&headers, header::CACHE_CONTROL),
            authorization: header_value(&headers, header::AUTHORIZATION),
        });

        let Some(&total) = api.totals.get(table.as_str()) else {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "ERROR_X", "detail": "d"})),
            )
                .into_response();
        };

        let start = (query.page - 1) * query.size;
        if query.page > 1 && start >= total {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({"error": "ERROR_INVALID_PAGE", "detail": "Invalid page."})),
            )
                .into_response();
        }
        let end = (start + query.size).min(total);
        let results: Vec<Value> = (start..end)
            .map(|seq| json!({"id": seq + 1, "seq": seq}))
            .collect();
        Json(json!({"count": total, "next": null, "previous": null, "results": results}))
            .into_response()
    }

    async fn one_row(Path((table, id)): Path<(String, RowId)>) -> Response {
        if table == "teams" && id == 1 {
            Json(json!({"id": 1, "name": "Falcons"})).into_response()
        } else {
            (
                StatusCode::NOT_FOUND,
                Json(json!({"error": "ERROR_ROW_DOES_NOT_EXIST"})),
            )
                .into_response()
        }
    }

    async fn serve(api: Arc<FakeApi>) -> String {
        let app = Router::new()
            .route("/api/database/rows/table/{table}/", get(list_rows))
            .route(
                "/api/database/rows/table/{table}/{id}/",
                get(one_row).patch(one_row),
            )
            .with_state(api);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/")
    }

    async fn setup(totals: &[(&'static str, u32)]) -> (Arc<FakeApi>, RestRowStore) {
        let api = Arc::new(FakeApi {
            totals: totals.iter().copied().collect(),
            ..FakeApi::default()
        });
        let base_url = serve(api.clone()).await;
        let store = RestRowStore::new(RestConfig::new(base_url).with_token("secret")).unwrap();
        (api, store)
    }

    fn fetcher() -> BulkCollectionFetcher {
        BulkCollectionFetcher::new(
            FetchOptions {
                page_size: 100,
                parallelism: 5,
                ..FetchOptions::default()
            },
            RetryPolicy::new(1, Duration::ZERO),
        )
    }

    fn seqs(rows: &[Row]) -> Vec<u64> {
        rows.iter()
            .map(|row| row.get("seq").and_then(Value::as_u64).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn bulk_walk_reads_every_row_in_order() {
        let (api, store) = setup(&[("teams", 250)]).await;
        let options = ReadOptions::listing(false);

        let report = fetcher()
            .fetch_all_with_report(|page, size| store.get_rows("teams", page, size, options))
            .await;

        assert_eq!(report.stop, StopReason::Exhausted);
        assert_eq!(seqs(&report.rows), (0..250).collect::<Vec<_>>());
        assert_eq!(report.rows.first().and_then(row_id), Some(1));

        let mut pages: Vec<u32> = api.seen.lock().unwrap().iter().map(|seen| seen.page).collect();
        pages.sort_unstable();
        // Index 0 is page 1; the batch after it spans pages 2 to 6.
        assert_eq!(pages, vec![1, 2, 3, 4, 5, 6]);
    }

    #[tokio::test]
    async fn exact_multiple_ends_on_not_found_page() {
        let (_api, store) = setup(&[("matches", 200)]).await;
        let options = ReadOptions::listing(false);

        assert!(
            store
                .get_rows("matches", 2, 100, options)
                .await
                .unwrap()
                .is_empty()
        );

        let report = fetcher()
            .fetch_all_with_report(|page, size| store.get_rows("matches", page, size, options))
            .await;
        assert_eq!(report.stop, StopReason::Exhausted);
        assert_eq!(seqs(&report.rows), (0..200).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn read_options_reach_the_wire() {
        let (api, store) = setup(&[("teams", 3)]).await;

        store
            .get_rows("teams", 0, 50, ReadOptions::listing(true))
            .await
            .unwrap();
        store
            .get_rows("teams", 0, 50, ReadOptions::default())
            .await
            .unwrap();

        let seen = api.seen.lock().unwrap().clone();
        assert_eq!(seen[0].table, "teams");
        assert_eq!((seen[0].page, seen[0].size), (1, 50));
        assert_eq!(seen[0].user_field_names.as_deref(), Some("true"));
        assert_eq!(seen[0].cache_control.as_deref(), Some("no-cache"));
        assert_eq!(seen[0].authorization.as_deref(), Some("Token secret"));

        assert_eq!(seen[1].user_field_names, None);
        assert_eq!(seen[1].cache_control, None);
    }

    #[tokio::test]
    async fn error_marker_on_failed_status_is_rejected() {
        let (_api, store) = setup(&[]).await;

        let err = store
            .get_rows("broken", 0, 10, ReadOptions::default())
            .await
            .unwrap_err();
        match err {
            StorageError::Rejected { message } => assert!(message.ends_with("ERROR_X (d)")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn single_rows_map_not_found() {
        let (_api, store) = setup(&[]).await;

        let found = store
            .get_row("teams", 1, ReadOptions::default())
            .await
            .unwrap();
        assert_eq!(found.and_then(|row| row_id(&row)), Some(1));
        assert!(
            store
                .get_row("teams", 2, ReadOptions::default())
                .await
                .unwrap()
                .is_none()
        );

        let missing = store.update_row("teams", 2, Row::new()).await;
        assert!(matches!(missing, Err(StorageError::Missing { id: 2, .. })));
    }
}
