//! # Match ranking and the discover deck
//!
//! [`rank_matches`] backs `GET /api/matches`: every other user with a positive
//! score, best first. [`discover`] backs `GET /api/discover`: the swipe deck of
//! users the caller has not swiped yet, narrowed by a [`CandidateFilter`].
//!
//! Both sort by score descending, then name, then id, so equal scores come out in
//! a stable order.

use std::cmp::Reverse;
use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::compatibility::compatibility;
use crate::models::{BudgetRange, UserRecord};

pub const DEFAULT_DECK_SIZE: usize = 20;
pub const MAX_DECK_SIZE: usize = 100;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RankedMatch {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub score: u8,
}

/// A profile card in the swipe deck.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: Uuid,
    pub name: String,
    pub location: Option<String>,
    pub budget: Option<BudgetRange>,
    pub move_in_date: Option<NaiveDate>,
    pub score: u8,
}

/// Filters from the swipe deck's filter panel. Every field is optional.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateFilter {
    pub location: Option<String>,
    pub budget_min: Option<u32>,
    pub budget_max: Option<u32>,
    pub move_in_before: Option<NaiveDate>,
    pub limit: Option<usize>,
}

impl CandidateFilter {
    /// Whether `user` passes the filter. Users who left a field blank pass
    /// the corresponding check.
    pub fn accepts(&self, user: &UserRecord) -> bool {
        let prefs = &user.preferences;
        if let Some(wanted) = self.location.as_deref().map(str::trim) {
            if !wanted.is_empty() {
                match prefs.location.as_deref() {
                    Some(location) if same_place(location, wanted) => {}
                    _ => return false,
                }
            }
        }
        if let Some(budget) = prefs.budget {
            if !budget.overlaps(self.budget_min, self.budget_max) {
                return false;
            }
        }
        if let (Some(before), Some(date)) = (self.move_in_before, prefs.move_in_date) {
            if date > before {
                return false;
            }
        }
        true
    }

    pub fn limit(&self) -> usize {
        self.limit
            .unwrap_or(DEFAULT_DECK_SIZE)
            .clamp(1, MAX_DECK_SIZE)
    }
}

/// Case-insensitive, including non-ASCII letters.
fn same_place(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Score descending, then name, then id.
type RankKey<'a> = (Reverse<u8>, &'a str, Uuid);

impl RankedMatch {
    fn rank_key(&self) -> RankKey<'_> {
        (Reverse(self.score), self.name.as_str(), self.id)
    }
}

impl Candidate {
    fn rank_key(&self) -> RankKey<'_> {
        (Reverse(self.score), self.name.as_str(), self.id)
    }
}

/// Score `me` against `others`, keep positive scores and sort best first.
pub fn rank_matches(me: &UserRecord, others: &[UserRecord]) -> Vec<RankedMatch> {
    let mut matches: Vec<RankedMatch> = others
        .iter()
        .filter(|other| other.id != me.id)
        .map(|other| RankedMatch {
            id: other.id,
            name: other.name.clone(),
            email: other.email.clone(),
            score: compatibility(&me.answers, &other.answers),
        })
        .filter(|m| m.score > 0)
        .collect();
    matches.sort_by(|a, b| a.rank_key().cmp(&b.rank_key()));
    matches
}

/// Build the swipe deck for `me`: unswiped users passing `filter`, best first.
/// Zero scores are kept so users without answers still get a deck.
pub fn discover(
    me: &UserRecord,
    others: &[UserRecord],
    swiped: &HashSet<Uuid>,
    filter: &CandidateFilter,
) -> Vec<Candidate> {
    let mut deck: Vec<Candidate> = others
        .iter()
        .filter(|other| other.id != me.id && !swiped.contains(&other.id))
        .filter(|other| filter.accepts(other))
        .map(|other| Candidate {
            id: other.id,
            name: other.name.clone(),
            location: other.preferences.location.clone(),
            budget: other.preferences.budget,
            move_in_date: other.preferences.move_in_date,
            score: compatibility(&me.answers, &other.answers),
        })
        .collect();
    deck.sort_by(|a, b| a.rank_key().cmp(&b.rank_key()));
    deck.truncate(filter.limit());
    deck
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Answer, Preferences};
    use chrono::Utc;

    fn user(name: &str, answers: &[u8]) -> UserRecord {
        let now = Utc::now();
        UserRecord {
            id: Uuid::new_v4(),
            email: format!("{}@example.com", name.to_lowercase()),
            name: name.to_string(),
            password_hash: String::new(),
            is_premium: false,
            answers: answers
                .iter()
                .enumerate()
                .map(|(i, &v)| Answer::new(i as u32, v))
                .collect(),
            preferences: Preferences::default(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_rank_matches_sorts_descending_and_drops_zero() {
        let me = user("Me", &[0, 0, 0]);
        let others = vec![
            user("Far", &[3, 3, 3]),
            user("Close", &[0, 0, 1]),
            user("Same", &[0, 0, 0]),
            user("Blank", &[]),
        ];

        let ranked = rank_matches(&me, &others);
        let names: Vec<&str> = ranked.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Same", "Close"]);
        assert_eq!(ranked[0].score, 100);
        assert_eq!(ranked[1].score, 89);
    }

    #[test]
    fn test_rank_matches_breaks_ties_by_name() {
        let me = user("Me", &[1]);
        let others = vec![user("Zoe", &[1]), user("Ana", &[1]), user("Max", &[1])];
        let names: Vec<String> = rank_matches(&me, &others)
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["Ana", "Max", "Zoe"]);
    }

    #[test]
    fn test_rank_matches_excludes_self() {
        let me = user("Me", &[2, 2]);
        let others = vec![me.clone(), user("Other", &[2, 2])];
        let ranked = rank_matches(&me, &others);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].name, "Other");
    }

    #[test]
    fn test_discover_skips_swiped_and_keeps_zero_scores() {
        let me = user("Me", &[1, 1]);
        let liked = user("Liked", &[1, 1]);
        let blank = user("Blank", &[]);
        let fresh = user("Fresh", &[1, 2]);
        let swiped: HashSet<Uuid> = [liked.id].into_iter().collect();

        let deck = discover(
            &me,
            &[liked, blank, fresh],
            &swiped,
            &CandidateFilter::default(),
        );
        let names: Vec<&str> = deck.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Fresh", "Blank"]);
        assert_eq!(deck[1].score, 0);
    }

    #[test]
    fn test_filter_location_budget_and_date() {
        let mut amsterdam = user("Amsterdam", &[]);
        amsterdam.preferences = Preferences {
            location: Some("Amsterdam".to_string()),
            budget: Some(BudgetRange { min: 600, max: 800 }),
            move_in_date: NaiveDate::from_ymd_opt(2026, 9, 1),
        };
        let open = user("Open", &[]);

        let filter = CandidateFilter {
            location: Some("amsterdam".to_string()),
            ..Default::default()
        };
        assert!(filter.accepts(&amsterdam));
        assert!(!filter.accepts(&open));

        let mut zurich = user("Zurich", &[]);
        zurich.preferences.location = Some("Zürich".to_string());
        let filter = CandidateFilter {
            location: Some(" ZÜRICH ".to_string()),
            ..Default::default()
        };
        assert!(filter.accepts(&zurich));
        assert!(!filter.accepts(&amsterdam));

        let filter = CandidateFilter {
            budget_max: Some(500),
            ..Default::default()
        };
        assert!(!filter.accepts(&amsterdam));
        assert!(filter.accepts(&open));

        let filter = CandidateFilter {
            move_in_before: NaiveDate::from_ymd_opt(2026, 8, 1),
            ..Default::default()
        };
        assert!(!filter.accepts(&amsterdam));
        assert!(filter.accepts(&open));
    }

    #[test]
    fn test_deck_limit_is_clamped() {
        assert_eq!(CandidateFilter::default().limit(), DEFAULT_DECK_SIZE);
        let filter = CandidateFilter {
            limit: Some(10_000),
            ..Default::default()
        };
        assert_eq!(filter.limit(), MAX_DECK_SIZE);
        let filter = CandidateFilter {
            limit: Some(0),
            ..Default::default()
        };
        assert_eq!(filter.limit(), 1);
    }
}
