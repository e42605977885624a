//! Background reconciler daemon.
//!
//! Sweeps every user's groups on an interval and repairs them from the
//! authoritative face docs. This is the passive half of the convergence
//! story: the engine tolerates crashes and concurrent batches because this
//! sweep (and the next read of any affected face) prefers the face doc.

use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use facegraph_db::repositories::GroupRepo;
use facegraph_engine::reconcile::reconcile_user;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "facegraph_worker=info,facegraph_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://facegraph.db".into());
    let interval_secs: u64 = std::env::var("RECONCILE_INTERVAL_SECS")
        .unwrap_or_else(|_| "300".into())
        .parse()
        .expect("RECONCILE_INTERVAL_SECS must be a valid u64");

    let pool = facegraph_db::create_pool(&database_url).await?;
    facegraph_db::schema::init_schema(&pool).await?;
    tracing::info!(%database_url, interval_secs, "Reconciler starting");

    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
    loop {
        ticker.tick().await;

        let users = match GroupRepo::distinct_user_ids(&pool).await {
            Ok(users) => users,
            Err(e) => {
                tracing::error!(error = %e, "Failed to enumerate users; will retry");
                continue;
            }
        };

        for user_id in users {
            match reconcile_user(&pool, &user_id).await {
                Ok(report) => {
                    if report.groups_repaired > 0 || report.groups_removed > 0 {
                        tracing::info!(
                            %user_id,
                            repaired = report.groups_repaired,
                            removed = report.groups_removed,
                            "Reconciled user"
                        );
                    }
                }
                Err(e) => {
                    tracing::error!(%user_id, error = %e, "Reconciliation failed for user");
                }
            }
        }
    }
}
