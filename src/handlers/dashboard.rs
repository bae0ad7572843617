use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Html,
};
use common::Selection;
use tracing::{debug, info, instrument, trace, warn};

use crate::pipeline::{APP_TITLE, PipelineError};
use crate::render::{Surface, Widget, page::HtmlPage};
use crate::schemas::{AppState, DashboardQuery};

/// Dashboard page: raw data and forecast for the selected ticker
///
/// Loading and fitting failures are shown inline in the page, so only an unknown ticker
/// or an out-of-range `months` is answered with an error status.
#[utoipa::path(
    get,
    path = "/",
    tag = "dashboard",
    params(DashboardQuery),
    responses(
        (status = 200, description = "Dashboard rendered", content_type = "text/html", body = String),
        (status = 400, description = "Invalid ticker or months", content_type = "text/html", body = String)
    )
)]
#[instrument(skip(state))]
pub async fn dashboard_page(
    Query(query): Query<DashboardQuery>,
    State(state): State<AppState>,
) -> (StatusCode, Html<String>) {
    trace!("Entering dashboard_page function");

    let selection = match Selection::parse(query.ticker.as_deref(), query.months) {
        Ok(selection) => selection,
        Err(e) => {
            warn!("Rejected dashboard selection: {}", e);
            let mut page = HtmlPage::new(Selection::default());
            page.push(Widget::Title(APP_TITLE.to_string()));
            page.push(PipelineError::from(e).to_widget());
            return (StatusCode::BAD_REQUEST, Html(page.render()));
        }
    };
    debug!("Rendering dashboard for {} over {} months", selection.ticker, selection.horizon.months());

    let mut page = HtmlPage::new(selection);
    let report = state.dashboard.run(selection, &mut page).await;
    info!(
        "Dashboard for {} ended in {:?} with {} widgets",
        selection.ticker,
        report.final_state(),
        page.widgets().len()
    );

    (StatusCode::OK, Html(page.render()))
}
