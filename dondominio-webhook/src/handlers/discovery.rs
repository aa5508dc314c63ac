//! `APIResourceList` served on `GET /apis/{group}/v1alpha1`

use actix_web::{HttpResponse, web};
use serde::Serialize;

use crate::payload::{PAYLOAD_KIND, SOLVER_VERSION};
use crate::server::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResourceList {
    pub kind: &'static str,
    pub api_version: &'static str,
    pub group_version: String,
    pub resources: Vec<ApiResource>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResource {
    pub name: String,
    pub singular_name: String,
    pub namespaced: bool,
    pub kind: &'static str,
    pub verbs: Vec<&'static str>,
}

impl ApiResourceList {
    pub fn for_state(state: &AppState) -> Self {
        Self {
            kind: "APIResourceList",
            api_version: "v1",
            group_version: format!("{}/{SOLVER_VERSION}", state.group_name),
            resources: state
                .solvers
                .iter()
                .map(|s| ApiResource {
                    name: s.name().to_string(),
                    singular_name: s.name().to_string(),
                    namespaced: false,
                    kind: PAYLOAD_KIND,
                    verbs: vec!["create"],
                })
                .collect(),
        }
    }
}

pub async fn resources(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> HttpResponse {
    let (group, version) = path.into_inner();
    if group != state.group_name || version != SOLVER_VERSION {
        return HttpResponse::NotFound().finish();
    }
    HttpResponse::Ok().json(ApiResourceList::for_state(&state))
}
