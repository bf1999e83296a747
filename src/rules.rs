//! Cross-field side effects applied after every video mutation.
//!
//! Rules run in table order, so a rule may rely on the effects of the rules
//! listed before it.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::model::{Video, VideoStatus};

/// What the rules know about the mutation besides the updated record.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext {
    /// Status before the mutation, `None` for freshly created entries.
    pub previous_status: Option<VideoStatus>,
    pub now: DateTime<Utc>,
}

pub struct PostUpdateRule {
    pub name: &'static str,
    pub applies: fn(&Video, &RuleContext) -> bool,
    pub apply: fn(&mut Video, &RuleContext),
}

pub const POST_UPDATE_RULES: &[PostUpdateRule] = &[
    PostUpdateRule {
        name: "complete-progress-marks-watched",
        applies: progress_is_complete,
        apply: mark_watched,
    },
    PostUpdateRule {
        name: "watched-stamps-date",
        applies: became_watched,
        apply: stamp_date_watched,
    },
];

fn progress_is_complete(video: &Video, _ctx: &RuleContext) -> bool {
    video.progress == 100
}

fn mark_watched(video: &mut Video, _ctx: &RuleContext) {
    video.status = VideoStatus::Watched;
}

fn became_watched(video: &Video, ctx: &RuleContext) -> bool {
    video.status == VideoStatus::Watched
        && (ctx.previous_status != Some(VideoStatus::Watched) || video.date_watched.is_none())
}

fn stamp_date_watched(video: &mut Video, ctx: &RuleContext) {
    video.date_watched = Some(ctx.now);
}

/// Applies every rule whose condition holds and returns the names of the
/// rules that fired.
pub fn apply_post_update_rules(video: &mut Video, ctx: &RuleContext) -> Vec<&'static str> {
    let mut fired = Vec::new();
    for rule in POST_UPDATE_RULES {
        if (rule.applies)(video, ctx) {
            (rule.apply)(video, ctx);
            fired.push(rule.name);
        }
    }
    if !fired.is_empty() {
        debug!(video = %video.id, rules = ?fired, "post-update rules applied");
    }
    fired
}
