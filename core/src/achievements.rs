//! Achievement catalogue and unlock evaluation.
//!
//! The catalogue is plain data: each rule names one counter and a threshold,
//! and a rule is unlocked once `counter >= threshold`. Adding an achievement
//! means adding a row to [`ACHIEVEMENTS`]; [`evaluate`] never changes.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    TotalWorkouts,
    TotalCompletions,
    StreakDays,
    Points,
    CompletedThisWeek,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AchievementRule {
    pub key: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub metric: Metric,
    pub threshold: u64,
}

/// Aggregate counters the rules are evaluated against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AchievementCounters {
    pub total_workouts: u64,
    pub total_completions: u64,
    pub streak_days: u64,
    pub points: u64,
    pub completed_this_week: u64,
}

impl AchievementCounters {
    #[must_use]
    pub fn value(&self, metric: Metric) -> u64 {
        match metric {
            Metric::TotalWorkouts => self.total_workouts,
            Metric::TotalCompletions => self.total_completions,
            Metric::StreakDays => self.streak_days,
            Metric::Points => self.points,
            Metric::CompletedThisWeek => self.completed_this_week,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AchievementState {
    pub key: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub unlocked: bool,
    pub metric: Metric,
    /// Current counter value, capped at the threshold.
    pub progress: u64,
    pub threshold: u64,
}

pub const ACHIEVEMENTS: &[AchievementRule] = &[
    AchievementRule {
        key: "first_workout",
        title: "First Workout",
        description: "Create your first workout plan.",
        metric: Metric::TotalWorkouts,
        threshold: 1,
    },
    AchievementRule {
        key: "workouts_5",
        title: "Planner",
        description: "Create 5 workout plans.",
        metric: Metric::TotalWorkouts,
        threshold: 5,
    },
    AchievementRule {
        key: "first_completion",
        title: "First Session",
        description: "Complete a workout for the first time.",
        metric: Metric::TotalCompletions,
        threshold: 1,
    },
    AchievementRule {
        key: "completions_10",
        title: "Getting Serious",
        description: "Complete 10 workouts.",
        metric: Metric::TotalCompletions,
        threshold: 10,
    },
    AchievementRule {
        key: "completions_25",
        title: "Committed",
        description: "Complete 25 workouts.",
        metric: Metric::TotalCompletions,
        threshold: 25,
    },
    AchievementRule {
        key: "completions_50",
        title: "Half Century",
        description: "Complete 50 workouts.",
        metric: Metric::TotalCompletions,
        threshold: 50,
    },
    AchievementRule {
        key: "week_2",
        title: "Twice This Week",
        description: "Complete 2 workouts in one week.",
        metric: Metric::CompletedThisWeek,
        threshold: 2,
    },
    AchievementRule {
        key: "week_4",
        title: "Four-Day Week",
        description: "Complete 4 workouts in one week.",
        metric: Metric::CompletedThisWeek,
        threshold: 4,
    },
    AchievementRule {
        key: "week_6",
        title: "Six-Pack Week",
        description: "Complete 6 workouts in one week.",
        metric: Metric::CompletedThisWeek,
        threshold: 6,
    },
    AchievementRule {
        key: "streak_3",
        title: "On a Roll",
        description: "Train 3 days in a row.",
        metric: Metric::StreakDays,
        threshold: 3,
    },
    AchievementRule {
        key: "streak_7",
        title: "Full Week",
        description: "Train 7 days in a row.",
        metric: Metric::StreakDays,
        threshold: 7,
    },
    AchievementRule {
        key: "streak_14",
        title: "Unstoppable",
        description: "Train 14 days in a row.",
        metric: Metric::StreakDays,
        threshold: 14,
    },
    AchievementRule {
        key: "points_100",
        title: "Century",
        description: "Earn 100 points.",
        metric: Metric::Points,
        threshold: 100,
    },
];

/// Evaluate every rule in table order.
#[must_use]
pub fn evaluate(rules: &[AchievementRule], counters: &AchievementCounters) -> Vec<AchievementState> {
    rules
        .iter()
        .map(|rule| {
            let value = counters.value(rule.metric);
            AchievementState {
                key: rule.key,
                title: rule.title,
                description: rule.description,
                unlocked: value >= rule.threshold,
                metric: rule.metric,
                progress: value.min(rule.threshold),
                threshold: rule.threshold,
            }
        })
        .collect()
}
