//! Priority adjustment recommendations.
//!
//! Compares each active task's fresh score against the priority band it
//! is stored under. A divergence produces a pending
//! [`PriorityRecommendation`]; under full autonomy the adjustment is
//! applied immediately and marked as such.

use chrono::Utc;
use tracing::{debug, info};

use crate::models::recommendation::PriorityRecommendation;
use crate::persistence::initiative_repo::InitiativeRepo;
use crate::persistence::recommendation_repo::RecommendationRepo;
use crate::persistence::task_repo::TaskRepo;
use crate::policy::AutonomyLevel;
use crate::scoring;
use crate::Result;

/// Generate priority recommendations for every active task.
///
/// Tasks that already have a pending recommendation are skipped, so the
/// periodic job does not stack duplicates for the same divergence.
/// Returns the number of recommendations generated (including any
/// auto-applied under full autonomy).
///
/// # Errors
///
/// Returns `AppError::Db` if any repository operation fails.
pub async fn generate_recommendations(
    tasks: &TaskRepo,
    initiatives: &InitiativeRepo,
    recommendations: &RecommendationRepo,
    level: AutonomyLevel,
) -> Result<usize> {
    debug!(%level, "recommendation pass starting");

    let active = tasks.list_active().await?;
    let all_initiatives = initiatives.list().await?;
    let now = Utc::now();

    let mut generated = 0usize;
    for task in &active {
        let initiative = task
            .initiative_id
            .as_deref()
            .and_then(|id| all_initiatives.iter().find(|init| init.id == id));
        let fresh = scoring::score(task, initiative, now);
        let band = scoring::band_for_score(fresh);
        if band == task.priority {
            continue;
        }
        if recommendations.has_pending_for_task(&task.id).await? {
            continue;
        }

        let recommendation = PriorityRecommendation::new(
            task.id.clone(),
            task.priority,
            band,
            fresh,
            format!(
                "score {fresh:.1} maps to {} but the task is stored as {}",
                band.as_str(),
                task.priority.as_str()
            ),
        );
        let recommendation = recommendations.create(&recommendation).await?;
        generated += 1;

        if level.allows_auto_adjustment() {
            tasks.update_priority(&task.id, band).await?;
            recommendations.mark_applied(&recommendation.id).await?;
            info!(task_id = %task.id, from = task.priority.as_str(), to = band.as_str(),
                "priority adjustment auto-applied");
        }
    }

    info!(count = generated, "recommendation pass complete");
    Ok(generated)
}
