//! `POST /apis/{group}/v1alpha1/{solver}`

use actix_web::{HttpResponse, web};

use crate::payload::{ChallengeAction, ChallengePayload, ChallengeResponse, SOLVER_VERSION};
use crate::server::AppState;

pub async fn solve(
    state: web::Data<AppState>,
    path: web::Path<(String, String, String)>,
    payload: web::Json<ChallengePayload>,
) -> HttpResponse {
    let (group, version, solver_name) = path.into_inner();
    if group != state.group_name || version != SOLVER_VERSION {
        return HttpResponse::NotFound().finish();
    }
    let Some(solver) = state.solver(&solver_name) else {
        tracing::warn!(solver = %solver_name, "No solver registered under this name");
        return HttpResponse::NotFound().body(format!("unknown solver {solver_name:?}"));
    };
    let Some(request) = payload.into_inner().request else {
        return HttpResponse::BadRequest().body("challenge payload has no request");
    };

    tracing::debug!(uid = %request.uid, action = ?request.action, "Challenge received");
    let result = match request.action {
        ChallengeAction::Present => solver.present(&request).await,
        ChallengeAction::CleanUp => solver.clean_up(&request).await,
    };

    let response = match result {
        Ok(()) => ChallengeResponse::success(&request.uid),
        Err(e) => {
            tracing::error!(uid = %request.uid, action = ?request.action, "Challenge failed: {e}");
            ChallengeResponse::failure(&request.uid, e.to_string())
        }
    };
    HttpResponse::Ok().json(ChallengePayload::reply(response))
}
