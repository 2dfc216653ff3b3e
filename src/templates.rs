use askama::Template;
use axum::response::Html;

use crate::{
    error::AppError,
    models::{AnalysisCounts, ModerationBacklog, ModeratorTally, ProcessingCounts, TaskStatus},
};

#[derive(Template)]
#[template(path = "monitor.html")]
pub struct MonitorTemplate {
    pub username: String,
    pub processing: ProcessingCounts,
    pub analysis: AnalysisCounts,
    pub moderation: ModerationBacklog,
}

#[derive(Template)]
#[template(path = "stats.html")]
pub struct StatsTemplate {
    pub stats_slugs: Vec<&'static str>,
}

#[derive(Template)]
#[template(path = "moderators.html")]
pub struct ModeratorsTemplate {
    pub moderators: Vec<ModeratorTally>,
}

#[derive(Template)]
#[template(path = "queue.html")]
pub struct QueueTemplate {
    pub tasks: Vec<TaskStatus>,
}

/// Renders any page template into an HTML response.
pub fn render<T: Template>(template: &T) -> Result<Html<String>, AppError> {
    Ok(Html(template.render()?))
}
