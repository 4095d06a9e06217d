//! Repository for the `frames` table.

use sqlx::PgPool;

use crate::models::frame::FrameRow;

/// Column list for `frames` queries.
const FRAME_COLUMNS: &str = "station, resolution, \"timestamp\", key AS remote_path";

/// Provides read access to the centralized artifact index.
pub struct FrameRepo;

impl FrameRepo {
    /// All rows for one station and resolution name, oldest first.
    pub async fn list_by_station_resolution(
        pool: &PgPool,
        station: &str,
        resolution: &str,
    ) -> Result<Vec<FrameRow>, sqlx::Error> {
        let query = format!(
            "SELECT {FRAME_COLUMNS} FROM frames \
             WHERE station = $1 AND resolution = $2 \
             ORDER BY \"timestamp\" ASC, key ASC"
        );
        sqlx::query_as::<_, FrameRow>(&query)
            .bind(station)
            .bind(resolution)
            .fetch_all(pool)
            .await
    }
}
