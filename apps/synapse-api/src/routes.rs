use axum::{
	Json, Router,
	extract::{Path, Query, State},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use synapse_service::{
	CreateItemRequest, Error as ServiceError, ItemView, ScoredItem, SearchRequest, SearchResponse,
};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
	pub q: String,
	pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct RelatedParams {
	pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
	pub items: Vec<ItemView>,
}

#[derive(Debug, Serialize)]
pub struct RelatedResponse {
	pub item_id: Uuid,
	pub related: Vec<ScoredItem>,
}

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/items", post(create_item).get(list_items))
		.route("/v1/items/{item_id}", get(get_item).delete(delete_item))
		.route("/v1/items/{item_id}/related", get(related_items))
		.route("/v1/items/{item_id}/refresh-image", post(refresh_image))
		.route("/v1/items/{item_id}/refresh-summary", post(refresh_summary))
		.route("/v1/search", get(search))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn create_item(
	State(state): State<AppState>,
	Json(payload): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<ItemView>), ApiError> {
	let item = state.service.create_item(payload).await?;

	Ok((StatusCode::CREATED, Json(item)))
}

async fn list_items(State(state): State<AppState>) -> Result<Json<ListResponse>, ApiError> {
	let items = state.service.list_items().await?;

	Ok(Json(ListResponse { items }))
}

async fn get_item(
	State(state): State<AppState>,
	Path(item_id): Path<Uuid>,
) -> Result<Json<ItemView>, ApiError> {
	Ok(Json(state.service.get_item(item_id).await?))
}

async fn delete_item(
	State(state): State<AppState>,
	Path(item_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
	state.service.delete_item(item_id).await?;

	Ok(StatusCode::NO_CONTENT)
}

async fn related_items(
	State(state): State<AppState>,
	Path(item_id): Path<Uuid>,
	Query(params): Query<RelatedParams>,
) -> Result<Json<RelatedResponse>, ApiError> {
	let related = state.service.find_related(item_id, params.limit).await?;

	Ok(Json(RelatedResponse { item_id, related }))
}

async fn refresh_image(
	State(state): State<AppState>,
	Path(item_id): Path<Uuid>,
) -> Result<Json<ItemView>, ApiError> {
	Ok(Json(state.service.refresh_image(item_id).await?))
}

async fn refresh_summary(
	State(state): State<AppState>,
	Path(item_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
	state.service.refresh_summary(item_id).await?;

	Ok(StatusCode::ACCEPTED)
}

async fn search(
	State(state): State<AppState>,
	Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
	let response =
		state.service.search(SearchRequest { query: params.q, limit: params.limit }).await?;

	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: &'static str,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: &'static str,
	message: String,
}
impl ApiError {
	fn new(status: StatusCode, error_code: &'static str, message: impl Into<String>) -> Self {
		Self { status, error_code, message: message.into() }
	}
}
impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::InvalidRequest { message } =>
				Self::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message),
			ServiceError::NotFound { message } =>
				Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message),
			ServiceError::Provider { message } =>
				Self::new(StatusCode::BAD_GATEWAY, "PROVIDER_ERROR", message),
			err @ ServiceError::SearchUnavailable { .. } =>
				Self::new(StatusCode::SERVICE_UNAVAILABLE, "SEARCH_UNAVAILABLE", err.to_string()),
			err @ (ServiceError::Storage { .. } | ServiceError::Qdrant { .. }) => {
				tracing::error!(error = %err, "Request failed on a storage backend.");

				Self::new(
					StatusCode::INTERNAL_SERVER_ERROR,
					"INTERNAL_ERROR",
					"Internal error.",
				)
			},
		}
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn service_errors_map_to_statuses() {
		let cases = [
			(ServiceError::InvalidRequest { message: "x".into() }, StatusCode::BAD_REQUEST),
			(ServiceError::NotFound { message: "x".into() }, StatusCode::NOT_FOUND),
			(ServiceError::Provider { message: "x".into() }, StatusCode::BAD_GATEWAY),
			(
				ServiceError::SearchUnavailable { semantic: "a".into(), lexical: "b".into() },
				StatusCode::SERVICE_UNAVAILABLE,
			),
			(ServiceError::Storage { message: "x".into() }, StatusCode::INTERNAL_SERVER_ERROR),
		];

		for (err, status) in cases {
			assert_eq!(ApiError::from(err).status, status);
		}
	}

	#[test]
	fn storage_details_stay_out_of_the_body() {
		let err = ApiError::from(ServiceError::Qdrant { message: "collection missing".into() });

		assert_eq!(err.error_code, "INTERNAL_ERROR");
		assert!(!err.message.contains("collection missing"));
	}
}
