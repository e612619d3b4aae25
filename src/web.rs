//! Single-page HTML form that asks the pipeline a question and shows the answer.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use tracing::{error, info};

use crate::pipeline::QuestionAnswerer;

const PAGE_TITLE: &str = "Python FAQs Question Answering App";
const FAQ_INDEX_URL: &str = "https://docs.python.org/3/faq/index.html";
/// Shown when the question field is blank.
pub const EMPTY_QUESTION_MESSAGE: &str = "Please enter a question to get an answer.";
/// Shown instead of error details when a query fails.
pub const QUERY_FAILED_MESSAGE: &str = "Query failed, please try again.";

#[derive(Clone)]
struct FormState {
    answerer: Arc<dyn QuestionAnswerer>,
}

/// Query string of the form page.
#[derive(Debug, Default, Deserialize)]
pub struct AskParams {
    /// Question text; absent on first visit.
    #[serde(default)]
    pub q: Option<String>,
}

/// What the answer region shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerView {
    /// No question submitted yet.
    Prompt,
    /// Generated answer text.
    Answer(String),
    /// The query failed.
    Failed,
}

/// Routes for the form page and a health probe.
pub fn router(answerer: Arc<dyn QuestionAnswerer>) -> Router {
    Router::new()
        .route("/", get(form_page))
        .route("/healthz", get(healthz))
        .with_state(FormState { answerer })
}

/// Serves the form on `addr` until Ctrl-C.
pub async fn serve(addr: SocketAddr, answerer: Arc<dyn QuestionAnswerer>) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "pyfaq form listening on http://{addr}");
    axum::serve(listener, router(answerer))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown requested");
        })
        .await
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn form_page(State(state): State<FormState>, Query(params): Query<AskParams>) -> Html<String> {
    let question = params.q.unwrap_or_default();
    let view = ask(state.answerer, question.trim()).await;
    Html(render_page(&question, &view))
}

/// Runs one question through `answerer` on the blocking pool.
///
/// A blank question never reaches the answerer.
pub async fn ask(answerer: Arc<dyn QuestionAnswerer>, question: &str) -> AnswerView {
    if question.is_empty() {
        return AnswerView::Prompt;
    }
    let owned = question.to_string();
    match tokio::task::spawn_blocking(move || answerer.answer(&owned)).await {
        Ok(Ok(answer)) => AnswerView::Answer(answer.text),
        Ok(Err(err)) => {
            error!(error = %err, "query failed");
            AnswerView::Failed
        }
        Err(err) => {
            error!(error = %err, "query task aborted");
            AnswerView::Failed
        }
    }
}

/// Renders the full page for the submitted `question` and answer region.
pub fn render_page(question: &str, view: &AnswerView) -> String {
    let answer_region = match view {
        AnswerView::Prompt => format!("<p class=\"hint\">{EMPTY_QUESTION_MESSAGE}</p>"),
        AnswerView::Answer(text) => format!(
            "<h3>Answer</h3>\n<p class=\"answer\">{}</p>",
            html_escape::encode_text(text)
        ),
        AnswerView::Failed => format!("<p class=\"error\">{QUERY_FAILED_MESSAGE}</p>"),
    };
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{PAGE_TITLE}</title>
<style>
  body {{ max-width: 46rem; margin: 2rem auto; font-family: sans-serif; color: #333; }}
  h1 {{ color: #4caf50; }}
  input[type=text] {{ width: 100%; padding: .5rem; font-size: 1.1em; box-sizing: border-box; }}
  .answer {{ white-space: pre-wrap; }}
  .error {{ color: #b00020; }}
</style>
</head>
<body>
<h1>{PAGE_TITLE}</h1>
<p>Enter your question about Python and get an answer grounded in the <a href="{FAQ_INDEX_URL}">Python FAQs</a>.</p>
<form method="get" action="/">
  <label for="q">Enter your question:</label>
  <input type="text" id="q" name="q" value="{}" autofocus>
</form>
{answer_region}
</body>
</html>
"#,
        html_escape::encode_double_quoted_attribute(question)
    )
}
