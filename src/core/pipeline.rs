use crate::config::toml_config::AppConfig;
use crate::core::input;
use crate::core::map::MapArtifact;
use crate::core::postal::PostalResolver;
use crate::core::report::{failures_to_table, RenderOutcome};
use crate::core::route::{color_for, RouteBuilder};
use crate::core::{Pipeline, PostalLookup, RouteService, Storage};
use crate::domain::model::{Coordinate, FailureRecord, ResolvedPoint, RouteLine, RouteRow, RunSummary};
use crate::utils::error::{Result, RowError};

/// A row that made it through resolution and routing.
struct RenderedRoute {
    source: ResolvedPoint,
    destination: ResolvedPoint,
    line: RouteLine,
}

pub struct RouteMapPipeline<S: Storage, L: PostalLookup, R: RouteService> {
    storage: S,
    config: AppConfig,
    resolver: PostalResolver<L>,
    builder: RouteBuilder<R>,
}

impl<S: Storage, L: PostalLookup, R: RouteService> RouteMapPipeline<S, L, R> {
    pub fn new(
        storage: S,
        config: AppConfig,
        resolver: PostalResolver<L>,
        builder: RouteBuilder<R>,
    ) -> Self {
        Self {
            storage,
            config,
            resolver,
            builder,
        }
    }

    async fn process_row(&self, row: &RouteRow) -> std::result::Result<RenderedRoute, RowError> {
        let source = self.resolver.resolve(&row.source_zip, &row.source_country)?;
        let destination = self
            .resolver
            .resolve(&row.destination_zip, &row.destination_country)?;
        let line = self.builder.build(&source, &destination).await?;

        Ok(RenderedRoute {
            source,
            destination,
            line,
        })
    }
}

#[async_trait::async_trait]
impl<S: Storage, L: PostalLookup, R: RouteService> Pipeline for RouteMapPipeline<S, L, R> {
    async fn extract(&self) -> Result<Vec<RouteRow>> {
        tracing::info!("🚀 Reading routes from: {}", self.config.input.path);
        let rows = input::load_routes(&self.config.input.path, self.config.delimiter_byte()?)?;
        tracing::info!("📊 Extracted {} route rows", rows.len());
        Ok(rows)
    }

    async fn transform(&self, rows: Vec<RouteRow>) -> Result<RenderOutcome> {
        tracing::info!(
            "🔧 Processing {} rows ({:?} mode)",
            rows.len(),
            self.builder.mode()
        );

        let total = rows.len();
        let mut map = MapArtifact::new(self.config.map.clone());
        let mut failures = Vec::new();
        let mut points: Vec<Coordinate> = Vec::new();
        let mut succeeded = 0;

        for (index, row) in rows.iter().enumerate() {
            match self.process_row(row).await {
                Ok(route) => {
                    // 提示文字沿用輸入的原始內容
                    let source_zip = row.source_zip.as_str();
                    let destination_zip = row.destination_zip.as_str();
                    let (src, dst) = (&route.source, &route.destination);

                    map.add_marker(
                        src.coordinate(),
                        format!("{} {} – {}", source_zip, src.country_code, src.place_name),
                    );
                    map.add_marker(
                        dst.coordinate(),
                        format!("{} {} – {}", destination_zip, dst.country_code, dst.place_name),
                    );
                    map.add_polyline(
                        route.line,
                        format!(
                            "{} {} → {} {}",
                            source_zip, src.country_code, destination_zip, dst.country_code
                        ),
                        color_for(index, total),
                    );

                    points.push(src.coordinate());
                    points.push(dst.coordinate());
                    succeeded += 1;
                }
                Err(e) => {
                    let record = FailureRecord::from_row(index, row, &e);
                    tracing::warn!(
                        "⚠️ Row {} failed ({}): {}",
                        record.row_number,
                        e.kind(),
                        e
                    );
                    failures.push(record);
                }
            }
        }

        if !points.is_empty() {
            map.fit_bounds(&points);
        }

        tracing::info!(
            "✅ Transform complete: {} succeeded, {} failed",
            succeeded,
            failures.len()
        );
        Ok(RenderOutcome {
            map,
            failures,
            succeeded,
        })
    }

    async fn load(&self, outcome: RenderOutcome) -> Result<RunSummary> {
        let output = &self.config.output;

        let html = outcome.map.render_html(chrono::Utc::now())?;
        self.storage.write_file(&output.map_file, html.as_bytes()).await?;
        let map_path = self.storage.location(&output.map_file);
        tracing::info!("🗺️  Map saved: {}", map_path);

        let failure_path = if outcome.failures.is_empty() {
            None
        } else {
            let table = failures_to_table(&outcome.failures, self.config.delimiter_byte()?)?;
            self.storage.write_file(&output.failures_file, &table).await?;
            let path = self.storage.location(&output.failures_file);
            tracing::warn!(
                "📝 {} failed row(s) written to {}",
                outcome.failures.len(),
                path
            );
            Some(path)
        };

        Ok(RunSummary {
            map_path,
            failure_path,
            succeeded: outcome.succeeded,
            failed: outcome.failures.len(),
        })
    }
}
