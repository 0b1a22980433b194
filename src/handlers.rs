use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query,
    },
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::{
    data_formats::{
        parse_timestamp, ArticleRequest, ArticleResponse, AuthorRequest, AuthorResponse,
        CategoryRequest, CategoryResponse, ImageRequest, ImageResponse, SearchParams,
    },
    db_helpers,
    errors::RequestError,
    JsonResponse,
};

type JsonResult<T> = Result<JsonResponse<T>, RequestError>;
type Pool = Extension<Arc<SqlitePool>>;

/// 200 with the list, or 204 when there is nothing to return.
fn list_response<T: Serialize>(items: Vec<T>) -> Response {
    if items.is_empty() {
        StatusCode::NO_CONTENT.into_response()
    } else {
        (StatusCode::OK, Json(items)).into_response()
    }
}

fn read_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, RequestError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| RequestError::MalformedInput(rejection.body_text()))
}

fn read_search(params: Result<Query<SearchParams>, QueryRejection>) -> Result<String, RequestError> {
    params
        .map(|Query(SearchParams { search_terms })| search_terms)
        .map_err(|rejection| RequestError::MalformedInput(rejection.body_text()))
}

// ----------------- Helper Handlers -----------------
pub async fn alive() -> &'static str {
    "alive"
}

pub async fn not_found(uri: Uri) -> Result<(), (StatusCode, String)> {
    Err((
        StatusCode::NOT_FOUND,
        format!("URL {} provided was not found", uri),
    ))
}

// ----------------- Article Handlers -----------------
pub async fn list_articles(Extension(pool): Pool) -> Result<Response, RequestError> {
    let articles = db_helpers::list_all_articles(&pool).await?;
    Ok(list_response(
        articles.into_iter().map(ArticleResponse::new).collect(),
    ))
}

pub async fn get_article(
    Extension(pool): Pool,
    Path(id): Path<i64>,
) -> JsonResult<ArticleResponse> {
    let article = db_helpers::find_article_in_db(&pool, id)
        .await?
        .ok_or(RequestError::NotFound)?;
    Ok((StatusCode::OK, Json(ArticleResponse::new(article))))
}

pub async fn create_article(
    Extension(pool): Pool,
    payload: Result<Json<ArticleRequest>, JsonRejection>,
) -> JsonResult<ArticleResponse> {
    let request = read_body(payload)?;
    let article = db_helpers::create_article_in_db(&pool, request).await?;
    tracing::info!(article_id = article.article.id, "created article");
    Ok((StatusCode::CREATED, Json(ArticleResponse::new(article))))
}

pub async fn update_article(
    Extension(pool): Pool,
    Path(id): Path<i64>,
    payload: Result<Json<ArticleRequest>, JsonRejection>,
) -> JsonResult<ArticleResponse> {
    let request = read_body(payload)?;
    let article = db_helpers::update_article_in_db(&pool, id, request).await?;
    tracing::info!(article_id = id, "updated article");
    Ok((StatusCode::OK, Json(ArticleResponse::new(article))))
}

pub async fn delete_article(
    Extension(pool): Pool,
    Path(id): Path<i64>,
) -> Result<StatusCode, RequestError> {
    db_helpers::delete_article_in_db(&pool, id).await?;
    tracing::info!(article_id = id, "deleted article");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn search_content(
    Extension(pool): Pool,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Response, RequestError> {
    let term = read_search(params)?;
    let articles = db_helpers::search_articles_by_content(&pool, &term).await?;
    Ok(list_response(
        articles.into_iter().map(ArticleResponse::new).collect(),
    ))
}

pub async fn search_after(
    Extension(pool): Pool,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Response, RequestError> {
    let after = parse_timestamp(&read_search(params)?)?;
    let articles = db_helpers::list_articles_created_after(&pool, after).await?;
    Ok(list_response(
        articles.into_iter().map(ArticleResponse::new).collect(),
    ))
}

pub async fn latest_articles(Extension(pool): Pool) -> Result<Response, RequestError> {
    let articles =
        db_helpers::list_latest_articles(&pool, db_helpers::LATEST_ARTICLES_LIMIT).await?;
    Ok(list_response(
        articles.into_iter().map(ArticleResponse::new).collect(),
    ))
}

// ----------------- Author Handlers -----------------
pub async fn list_authors(Extension(pool): Pool) -> Result<Response, RequestError> {
    let authors = db_helpers::list_all_authors(&pool).await?;
    Ok(list_response(
        authors.into_iter().map(AuthorResponse::new).collect(),
    ))
}

pub async fn get_author(
    Extension(pool): Pool,
    Path(id): Path<i64>,
) -> JsonResult<AuthorResponse> {
    let author = db_helpers::find_author_in_db(&pool, id)
        .await?
        .ok_or(RequestError::NotFound)?;
    Ok((StatusCode::OK, Json(AuthorResponse::new(author))))
}

pub async fn create_author(
    Extension(pool): Pool,
    payload: Result<Json<AuthorRequest>, JsonRejection>,
) -> JsonResult<AuthorResponse> {
    let request = read_body(payload)?;
    let author = db_helpers::create_author_in_db(&pool, request).await?;
    tracing::info!(author_id = author.author.id, "created author");
    Ok((StatusCode::CREATED, Json(AuthorResponse::new(author))))
}

pub async fn update_author(
    Extension(pool): Pool,
    Path(id): Path<i64>,
    payload: Result<Json<AuthorRequest>, JsonRejection>,
) -> JsonResult<AuthorResponse> {
    let request = read_body(payload)?;
    let author = db_helpers::update_author_in_db(&pool, id, request).await?;
    tracing::info!(author_id = id, "updated author");
    Ok((StatusCode::OK, Json(AuthorResponse::new(author))))
}

pub async fn delete_author(
    Extension(pool): Pool,
    Path(id): Path<i64>,
) -> Result<StatusCode, RequestError> {
    db_helpers::delete_author_in_db(&pool, id).await?;
    tracing::info!(author_id = id, "deleted author");
    Ok(StatusCode::NO_CONTENT)
}

// ----------------- Category Handlers -----------------
pub async fn list_categories(Extension(pool): Pool) -> Result<Response, RequestError> {
    let categories = db_helpers::list_categories_in_db(&pool).await?;
    Ok(list_response(
        categories
            .into_iter()
            .map(CategoryResponse::from)
            .collect(),
    ))
}

pub async fn get_category(
    Extension(pool): Pool,
    Path(id): Path<i64>,
) -> JsonResult<CategoryResponse> {
    let category = db_helpers::find_category_in_db(&pool, id)
        .await?
        .ok_or(RequestError::NotFound)?;
    Ok((StatusCode::OK, Json(category.into())))
}

pub async fn create_category(
    Extension(pool): Pool,
    payload: Result<Json<CategoryRequest>, JsonRejection>,
) -> JsonResult<CategoryResponse> {
    let category = db_helpers::create_category_in_db(&pool, read_body(payload)?).await?;
    Ok((StatusCode::CREATED, Json(category.into())))
}

pub async fn update_category(
    Extension(pool): Pool,
    Path(id): Path<i64>,
    payload: Result<Json<CategoryRequest>, JsonRejection>,
) -> JsonResult<CategoryResponse> {
    let category = db_helpers::update_category_in_db(&pool, id, read_body(payload)?).await?;
    Ok((StatusCode::OK, Json(category.into())))
}

pub async fn delete_category(
    Extension(pool): Pool,
    Path(id): Path<i64>,
) -> Result<StatusCode, RequestError> {
    db_helpers::delete_category_in_db(&pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ----------------- Image Handlers -----------------
pub async fn list_images(Extension(pool): Pool) -> Result<Response, RequestError> {
    let images = db_helpers::list_images_in_db(&pool).await?;
    Ok(list_response(
        images.into_iter().map(ImageResponse::from).collect(),
    ))
}

pub async fn get_image(Extension(pool): Pool, Path(id): Path<i64>) -> JsonResult<ImageResponse> {
    let image = db_helpers::find_image_in_db(&pool, id)
        .await?
        .ok_or(RequestError::NotFound)?;
    Ok((StatusCode::OK, Json(image.into())))
}

pub async fn create_image(
    Extension(pool): Pool,
    payload: Result<Json<ImageRequest>, JsonRejection>,
) -> JsonResult<ImageResponse> {
    let image = db_helpers::create_image_in_db(&pool, read_body(payload)?).await?;
    Ok((StatusCode::CREATED, Json(image.into())))
}

pub async fn update_image(
    Extension(pool): Pool,
    Path(id): Path<i64>,
    payload: Result<Json<ImageRequest>, JsonRejection>,
) -> JsonResult<ImageResponse> {
    let image = db_helpers::update_image_in_db(&pool, id, read_body(payload)?).await?;
    Ok((StatusCode::OK, Json(image.into())))
}

pub async fn delete_image(
    Extension(pool): Pool,
    Path(id): Path<i64>,
) -> Result<StatusCode, RequestError> {
    db_helpers::delete_image_in_db(&pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
