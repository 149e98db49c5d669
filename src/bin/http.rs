#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::net::SocketAddr;

    use lesson_planner::{LessonPlanner, PlannerSettings, http_api, telemetry};

    telemetry::init_tracing();

    let addr: SocketAddr = std::env::var("LESSON_PLANNER_HTTP_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        .parse()?;

    let planner = match std::env::var("LESSON_PLANNER_SETTINGS") {
        Ok(path) => LessonPlanner::with_settings(PlannerSettings::load_from_json(path)?),
        Err(_) => LessonPlanner::new(),
    };

    println!("lesson-planner HTTP API listening on http://{addr}");
    http_api::serve(addr, planner).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
