//! Ranked matches and the swipe deck.

use std::collections::HashSet;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::Serialize;
use store::ranking::{self, Candidate, CandidateFilter, RankedMatch};

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct MatchesResponse {
    pub matches: Vec<RankedMatch>,
}

#[derive(Debug, Serialize)]
pub struct DiscoverResponse {
    pub candidates: Vec<Candidate>,
}

/// Every other user with a positive score, best first.
pub async fn list_matches(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<MatchesResponse>> {
    let others = state.store.users_except(user.id).await?;
    Ok(Json(MatchesResponse {
        matches: ranking::rank_matches(&user, &others),
    }))
}

/// Users the caller has not swiped yet, filtered by the query string.
pub async fn discover(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    filter: Result<Query<CandidateFilter>, QueryRejection>,
) -> ApiResult<Json<DiscoverResponse>> {
    let Query(filter) = filter?;
    let others = state.store.users_except(user.id).await?;
    let swiped: HashSet<_> = state.store.swiped_by(user.id).await?.into_iter().collect();

    Ok(Json(DiscoverResponse {
        candidates: ranking::discover(&user, &others, &swiped, &filter),
    }))
}
