use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use rolebook_store::{BookUpdate, NewBook, Page};

use crate::dto::{
    BookListResponse, CreateBookRequest, ListParams, UpdateBookRequest, to_book_response,
};
use crate::error::ApiError;
use crate::server::AppState;

pub async fn list_books(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<BookListResponse>, ApiError> {
    let page = Page::new(params.page, params.page_size);
    let (books, total) = state.books.list_books(page).await?;
    Ok(Json(BookListResponse {
        total,
        list: books.into_iter().map(to_book_response).collect(),
    }))
}

pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<crate::dto::BookResponse>, ApiError> {
    let book = state.books.get_book(id).await?;
    Ok(Json(to_book_response(book)))
}

pub async fn create_book(
    State(state): State<AppState>,
    Json(req): Json<CreateBookRequest>,
) -> Result<(StatusCode, Json<crate::dto::BookResponse>), ApiError> {
    let book = state
        .books
        .create_book(NewBook {
            title: req.title,
            author: req.author,
            price: req.price,
            description: req.description,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(to_book_response(book))))
}

pub async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateBookRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .books
        .update_book(
            id,
            BookUpdate {
                title: req.title,
                author: req.author,
                price: req.price,
                description: req.description,
            },
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.books.delete_book(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
