use std::sync::Arc;

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};
use futures::future::try_join_all;
use tracing::debug;

use shared_database::{AppState, ClinicStore};
use shared_models::appointment::{AppointmentFilter, AppointmentStatus};
use shared_models::auth::User;

use crate::models::{AppointmentError, DashboardStats};
use crate::services::policy;

pub struct DashboardService {
    store: Arc<dyn ClinicStore>,
}

/// First instant of `date` in `tz`. Where midnight does not exist (a DST
/// gap), the day starts at the first valid hour.
fn start_of_day<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default();

    (0..3)
        .find_map(|hour| {
            tz.from_local_datetime(&(midnight + Duration::hours(hour)))
                .earliest()
        })
        .map(|start| start.with_timezone(&Utc))
        .unwrap_or_else(|| midnight.and_utc())
}

/// `[midnight, next midnight)` of the calendar day containing `now`, in
/// `now`'s own timezone.
pub fn day_window<Tz: TimeZone>(now: &DateTime<Tz>) -> (DateTime<Utc>, DateTime<Utc>) {
    let tz = now.timezone();
    let today = now.date_naive();
    let tomorrow = today.succ_opt().unwrap_or(today);

    (start_of_day(&tz, today), start_of_day(&tz, tomorrow))
}

impl DashboardService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: Arc::clone(&state.store),
        }
    }

    pub async fn dashboard_stats(&self, actor: &User) -> Result<DashboardStats, AppointmentError> {
        self.dashboard_stats_at(actor, Local::now()).await
    }

    /// Counts over everything `actor` can see, with "today" taken from `now`.
    pub async fn dashboard_stats_at<Tz: TimeZone>(
        &self,
        actor: &User,
        now: DateTime<Tz>,
    ) -> Result<DashboardStats, AppointmentError> {
        let scope = policy::visibility_filter(actor);
        let (day_start, day_end) = day_window(&now);
        debug!("Dashboard for {} {}, today is [{}, {})", actor.role, actor.id, day_start, day_end);

        let today_filter = AppointmentFilter {
            date_from: Some(day_start),
            date_to: Some(day_end),
            ..scope.clone()
        };

        let mut filters = vec![scope.clone(), today_filter];
        filters.extend(AppointmentStatus::ALL.map(|status| scope.clone().with_status(status)));

        let counts = try_join_all(filters.iter().map(|filter| self.store.count_appointments(filter))).await?;

        Ok(DashboardStats {
            total: counts[0],
            today: counts[1],
            pending: counts[2],
            confirmed: counts[3],
            completed: counts[4],
            cancelled: counts[5],
        })
    }
}
