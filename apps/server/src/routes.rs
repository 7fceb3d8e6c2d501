//! HTTP routes: index listing, random redirect, and the article endpoint
//! that triggers lazy materialization.

use std::convert::Infallible;
use std::sync::Arc;

use tracing::{error, warn};
use warp::http::{StatusCode, Uri};
use warp::{Filter, Rejection, Reply};

use babelwiki_core::get_or_create_article;
use babelwiki_generation::{SamplingParams, TextGenerator};
use babelwiki_render::{keyword_to_href, render_error, render_index, render_page};
use babelwiki_shared::BabelWikiError;
use babelwiki_storage::Storage;

/// Keyword suggested when `/random` finds an empty store — visiting it
/// materializes the encyclopedia's first page.
const EMPTY_STORE_SUGGESTION: &str = "The Infinite Library";

/// Shared per-process state handed to every request.
pub struct AppState {
    pub storage: Storage,
    pub generator: Arc<dyn TextGenerator>,
    pub params: SamplingParams,
    pub index_limit: u32,
}

/// Assemble the full route tree.
pub fn routes(
    state: Arc<AppState>,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let index = warp::path::end()
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handle_index);

    let random = warp::path!("random")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handle_random);

    let article = warp::path!(String)
        .and(warp::get())
        .and(with_state(state))
        .and_then(handle_article);

    index.or(random).or(article).recover(handle_rejection)
}

fn with_state(
    state: Arc<AppState>,
) -> impl Filter<Extract = (Arc<AppState>,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /` — list stored keywords as wiki links.
async fn handle_index(state: Arc<AppState>) -> Result<impl Reply, Rejection> {
    let keywords = state
        .storage
        .list_keywords(state.index_limit)
        .await
        .map_err(reject)?;
    Ok(warp::reply::html(render_index(&keywords)))
}

/// `GET /random` — redirect to an approximately random stored article, or
/// to a fixed suggestion when nothing exists yet.
async fn handle_random(state: Arc<AppState>) -> Result<impl Reply, Rejection> {
    let keyword = state
        .storage
        .random_keyword()
        .await
        .map_err(reject)?
        .unwrap_or_else(|| EMPTY_STORE_SUGGESTION.to_string());

    let uri: Uri = keyword_to_href(&keyword)
        .parse()
        .map_err(|e| reject(BabelWikiError::Storage(format!("bad redirect target: {e}"))))?;
    Ok(warp::redirect::temporary(uri))
}

/// `GET /{keyword}` — return the article, generating it on first visit.
async fn handle_article(
    raw_keyword: String,
    state: Arc<AppState>,
) -> Result<impl Reply, Rejection> {
    let article = get_or_create_article(
        &state.storage,
        state.generator.as_ref(),
        &state.params,
        &raw_keyword,
    )
    .await
    .map_err(reject)?;

    Ok(warp::reply::html(render_page(
        &article.keyword,
        &article.content,
    )))
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// Wrapper carrying pipeline errors through warp's rejection system.
#[derive(Debug)]
struct AppRejection(BabelWikiError);

impl warp::reject::Reject for AppRejection {}

fn reject(e: BabelWikiError) -> Rejection {
    warp::reject::custom(AppRejection(e))
}

/// Map rejections to HTML error pages with appropriate status codes.
async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, message) = if let Some(AppRejection(e)) = err.find::<AppRejection>() {
        match e {
            BabelWikiError::InvalidKeyword { .. } => {
                warn!(error = %e, "rejected keyword");
                (StatusCode::BAD_REQUEST, e.to_string())
            }
            BabelWikiError::Generation(_) => {
                error!(error = %e, "generation failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "article generation failed, try again later".to_string(),
                )
            }
            _ => {
                error!(error = %e, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                )
            }
        }
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, "page not found".to_string())
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal error".to_string(),
        )
    };

    let body = render_error(status.canonical_reason().unwrap_or("Error"), &message);
    Ok(warp::reply::with_status(warp::reply::html(body), status))
}
