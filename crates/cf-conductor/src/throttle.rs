//! Throttle Admission
//!
//! Decides whether a play request may start given the leases already
//! playing. Four scopes are checked in a fixed order:
//!
//! ```text
//! Cue -> CueSheet -> Category -> Global
//! ```
//!
//! Each scope is one row of [`SCOPE_TABLE`]: a membership test and the place
//! its `(type, limit)` rule comes from. The decision is computed on a
//! snapshot; the caller applies evictions only when the candidate is
//! admitted.

use cf_core::{CategoryId, ThrottleRule, ThrottleType};

use crate::handle::{CueSheetHandle, LeaseHandle};

// ═══════════════════════════════════════════════════════════════════════════════
// TYPES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ThrottleScope {
    Cue = 0,
    CueSheet = 1,
    Category = 2,
    Global = 3,
}

impl ThrottleScope {
    pub fn display_name(&self) -> &'static str {
        match self {
            ThrottleScope::Cue => "Cue",
            ThrottleScope::CueSheet => "Cue Sheet",
            ThrottleScope::Category => "Category",
            ThrottleScope::Global => "Global",
        }
    }
}

/// Throttle-relevant view of one active lease
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaseInfo {
    pub lease: LeaseHandle,
    pub cue_sheet: CueSheetHandle,
    pub cue_index: usize,
    pub category_id: Option<CategoryId>,
    pub priority: i32,
}

/// The request being admitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub cue_sheet: CueSheetHandle,
    pub cue_index: usize,
    pub category_id: Option<CategoryId>,
    pub priority: i32,
}

/// Rule per scope. `category` is None when the cue's category id does not
/// resolve, which skips that scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScopeRules {
    pub cue: ThrottleRule,
    pub cue_sheet: ThrottleRule,
    pub category: Option<ThrottleRule>,
    pub global: ThrottleRule,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Everything playing outranks the candidate
    LowerPriority,
    /// Equal priority under a first-come-first-served rule
    FirstComeFirstServed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Start the candidate after stopping `evict` (in order)
    Admitted { evict: Vec<LeaseHandle> },
    Rejected {
        scope: ThrottleScope,
        reason: RejectReason,
    },
}

impl Admission {
    #[inline]
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted { .. })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SCOPE TABLE
// ═══════════════════════════════════════════════════════════════════════════════

struct ScopeEntry {
    scope: ThrottleScope,
    matches: fn(&LeaseInfo, &Candidate) -> bool,
    rule: fn(&ScopeRules) -> Option<ThrottleRule>,
}

const SCOPE_TABLE: [ScopeEntry; 4] = [
    ScopeEntry {
        scope: ThrottleScope::Cue,
        matches: |lease, candidate| {
            lease.cue_sheet == candidate.cue_sheet && lease.cue_index == candidate.cue_index
        },
        rule: |rules| Some(rules.cue),
    },
    ScopeEntry {
        scope: ThrottleScope::CueSheet,
        matches: |lease, candidate| lease.cue_sheet == candidate.cue_sheet,
        rule: |rules| Some(rules.cue_sheet),
    },
    ScopeEntry {
        scope: ThrottleScope::Category,
        matches: |lease, candidate| {
            candidate.category_id.is_some() && lease.category_id == candidate.category_id
        },
        rule: |rules| rules.category,
    },
    ScopeEntry {
        scope: ThrottleScope::Global,
        matches: |_, _| true,
        rule: |rules| Some(rules.global),
    },
];

// ═══════════════════════════════════════════════════════════════════════════════
// ADMISSION
// ═══════════════════════════════════════════════════════════════════════════════

/// Run the four-scope admission check.
///
/// The minimum priority is taken once over all of `active`. Leases chosen for
/// eviction by an earlier scope no longer count toward later scopes. A full
/// scope with no minimum-priority member admits the candidate over its limit.
pub fn admit(active: &[LeaseInfo], candidate: &Candidate, rules: &ScopeRules) -> Admission {
    let min_priority = active.iter().map(|lease| lease.priority).min();
    let mut working: Vec<LeaseInfo> = active.to_vec();
    let mut evict = Vec::new();

    for entry in &SCOPE_TABLE {
        let Some(rule) = (entry.rule)(rules) else {
            continue;
        };
        if !rule.is_limited() {
            continue;
        }

        let in_scope = working
            .iter()
            .filter(|lease| (entry.matches)(lease, candidate))
            .count();
        if in_scope < rule.limit as usize {
            continue;
        }
        let Some(min_priority) = min_priority else {
            continue;
        };

        if min_priority > candidate.priority {
            return Admission::Rejected {
                scope: entry.scope,
                reason: RejectReason::LowerPriority,
            };
        }

        // Strictly higher priority always evicts, whatever the scope's rule says
        let throttle_type = if candidate.priority > min_priority {
            ThrottleType::PriorityOrder
        } else {
            rule.throttle_type
        };

        match throttle_type {
            ThrottleType::FirstComeFirstServed => {
                return Admission::Rejected {
                    scope: entry.scope,
                    reason: RejectReason::FirstComeFirstServed,
                };
            }
            ThrottleType::PriorityOrder => {
                let victim = working.iter().position(|lease| {
                    lease.priority == min_priority && (entry.matches)(lease, candidate)
                });
                // No minimum-priority lease in scope: admit without making room
                if let Some(index) = victim {
                    evict.push(working.remove(index).lease);
                }
            }
        }
    }

    Admission::Admitted { evict }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHEET_A: CueSheetHandle = CueSheetHandle::from_raw(1);
    const SHEET_B: CueSheetHandle = CueSheetHandle::from_raw(2);

    fn lease(
        id: u32,
        sheet: CueSheetHandle,
        cue: usize,
        category: Option<CategoryId>,
        priority: i32,
    ) -> LeaseInfo {
        LeaseInfo {
            lease: LeaseHandle::from_raw(id),
            cue_sheet: sheet,
            cue_index: cue,
            category_id: category,
            priority,
        }
    }

    fn candidate(
        sheet: CueSheetHandle,
        cue: usize,
        category: Option<CategoryId>,
        priority: i32,
    ) -> Candidate {
        Candidate {
            cue_sheet: sheet,
            cue_index: cue,
            category_id: category,
            priority,
        }
    }

    fn global(throttle_type: ThrottleType, limit: u32) -> ScopeRules {
        ScopeRules {
            global: ThrottleRule::new(throttle_type, limit),
            ..ScopeRules::default()
        }
    }

    #[test]
    fn test_unlimited_always_admits() {
        let active: Vec<_> = (1..=50).map(|i| lease(i, SHEET_A, 0, None, 0)).collect();
        let decision = admit(
            &active,
            &candidate(SHEET_A, 0, None, 0),
            &ScopeRules::default(),
        );
        assert_eq!(decision, Admission::Admitted { evict: vec![] });
    }

    #[test]
    fn test_below_limit_admits() {
        let active = vec![lease(1, SHEET_A, 0, None, 0)];
        let rules = global(ThrottleType::FirstComeFirstServed, 2);
        let decision = admit(&active, &candidate(SHEET_A, 0, None, 0), &rules);
        assert!(decision.is_admitted());
    }

    #[test]
    fn test_lower_priority_rejected_for_any_type() {
        let active = vec![lease(1, SHEET_A, 0, None, 5)];
        for throttle_type in [ThrottleType::PriorityOrder, ThrottleType::FirstComeFirstServed] {
            let rules = global(throttle_type, 1);
            let decision = admit(&active, &candidate(SHEET_A, 0, None, 4), &rules);
            assert_eq!(
                decision,
                Admission::Rejected {
                    scope: ThrottleScope::Global,
                    reason: RejectReason::LowerPriority
                }
            );
        }
    }

    #[test]
    fn test_equal_priority_fcfs_rejects() {
        let active = vec![lease(1, SHEET_A, 0, None, 3)];
        let rules = global(ThrottleType::FirstComeFirstServed, 1);
        let decision = admit(&active, &candidate(SHEET_A, 0, None, 3), &rules);
        assert_eq!(
            decision,
            Admission::Rejected {
                scope: ThrottleScope::Global,
                reason: RejectReason::FirstComeFirstServed
            }
        );
    }

    #[test]
    fn test_higher_priority_overrides_fcfs() {
        let active = vec![lease(1, SHEET_A, 0, None, 1), lease(2, SHEET_A, 0, None, 1)];
        let rules = global(ThrottleType::FirstComeFirstServed, 2);
        let decision = admit(&active, &candidate(SHEET_A, 0, None, 2), &rules);
        assert_eq!(
            decision,
            Admission::Admitted {
                evict: vec![LeaseHandle::from_raw(1)]
            }
        );
    }

    #[test]
    fn test_priority_order_evicts_first_minimum() {
        let active = vec![
            lease(1, SHEET_A, 0, None, 2),
            lease(2, SHEET_A, 0, None, 1),
            lease(3, SHEET_A, 0, None, 1),
        ];
        let rules = global(ThrottleType::PriorityOrder, 3);
        let decision = admit(&active, &candidate(SHEET_A, 0, None, 1), &rules);
        assert_eq!(
            decision,
            Admission::Admitted {
                evict: vec![LeaseHandle::from_raw(2)]
            }
        );
    }

    #[test]
    fn test_cue_scope_only_counts_same_cue() {
        let rules = ScopeRules {
            cue: ThrottleRule::new(ThrottleType::FirstComeFirstServed, 1),
            ..ScopeRules::default()
        };
        let active = vec![lease(1, SHEET_A, 0, None, 0), lease(2, SHEET_B, 1, None, 0)];

        // Other cue index on the same sheet: not at capacity
        assert!(admit(&active, &candidate(SHEET_A, 1, None, 0), &rules).is_admitted());
        // Same cue: at capacity
        assert!(!admit(&active, &candidate(SHEET_A, 0, None, 0), &rules).is_admitted());
    }

    #[test]
    fn test_cue_sheet_scope_victim_is_in_scope() {
        let rules = ScopeRules {
            cue_sheet: ThrottleRule::new(ThrottleType::PriorityOrder, 1),
            ..ScopeRules::default()
        };
        // Global minimum lives on sheet B, sheet A holds a priority-0 lease too
        let active = vec![lease(1, SHEET_B, 0, None, 0), lease(2, SHEET_A, 0, None, 0)];
        let decision = admit(&active, &candidate(SHEET_A, 3, None, 0), &rules);
        assert_eq!(
            decision,
            Admission::Admitted {
                evict: vec![LeaseHandle::from_raw(2)]
            }
        );
    }

    #[test]
    fn test_full_scope_without_minimum_member_admits_without_eviction() {
        let rules = ScopeRules {
            cue_sheet: ThrottleRule::new(ThrottleType::PriorityOrder, 1),
            ..ScopeRules::default()
        };
        // Sheet A is full with a priority-5 lease; the global minimum (1) is on sheet B
        let active = vec![lease(1, SHEET_A, 0, None, 5), lease(2, SHEET_B, 0, None, 1)];
        for priority in [3, 7] {
            let decision = admit(&active, &candidate(SHEET_A, 0, None, priority), &rules);
            assert_eq!(decision, Admission::Admitted { evict: vec![] });
        }
    }

    #[test]
    fn test_cue_scope_victim_is_in_scope() {
        let rules = ScopeRules {
            cue: ThrottleRule::new(ThrottleType::PriorityOrder, 1),
            ..ScopeRules::default()
        };
        // Older minimum-priority lease on another cue of the same sheet
        let active = vec![lease(1, SHEET_A, 2, None, 0), lease(2, SHEET_A, 0, None, 0)];
        let decision = admit(&active, &candidate(SHEET_A, 0, None, 0), &rules);
        assert_eq!(
            decision,
            Admission::Admitted {
                evict: vec![LeaseHandle::from_raw(2)]
            }
        );
    }

    #[test]
    fn test_category_scope_victim_is_in_scope() {
        let rules = ScopeRules {
            category: Some(ThrottleRule::new(ThrottleType::PriorityOrder, 1)),
            ..ScopeRules::default()
        };
        // Older minimum-priority leases in another category and with no category
        let active = vec![
            lease(1, SHEET_B, 0, Some(4), 0),
            lease(2, SHEET_A, 1, None, 0),
            lease(3, SHEET_B, 1, Some(7), 0),
        ];
        let decision = admit(&active, &candidate(SHEET_A, 0, Some(7), 0), &rules);
        assert_eq!(
            decision,
            Admission::Admitted {
                evict: vec![LeaseHandle::from_raw(3)]
            }
        );
    }

    #[test]
    fn test_unresolved_category_is_skipped() {
        let rules = ScopeRules {
            category: None,
            ..ScopeRules::default()
        };
        let active = vec![lease(1, SHEET_A, 0, Some(9), 0)];
        assert!(admit(&active, &candidate(SHEET_A, 0, Some(9), 0), &rules).is_admitted());

        let rules = ScopeRules {
            category: Some(ThrottleRule::new(ThrottleType::FirstComeFirstServed, 1)),
            ..ScopeRules::default()
        };
        assert!(!admit(&active, &candidate(SHEET_A, 0, Some(9), 0), &rules).is_admitted());
        assert!(admit(&active, &candidate(SHEET_A, 0, Some(3), 0), &rules).is_admitted());
    }

    #[test]
    fn test_later_scope_rejection_discards_evictions() {
        let rules = ScopeRules {
            cue: ThrottleRule::new(ThrottleType::PriorityOrder, 1),
            global: ThrottleRule::new(ThrottleType::FirstComeFirstServed, 1),
            ..ScopeRules::default()
        };
        let active = vec![lease(1, SHEET_A, 0, None, 0), lease(2, SHEET_B, 0, None, 0)];
        let decision = admit(&active, &candidate(SHEET_A, 0, None, 0), &rules);
        assert!(!decision.is_admitted());
    }

    #[test]
    fn test_empty_active_set() {
        let rules = global(ThrottleType::FirstComeFirstServed, 1);
        let decision = admit(&[], &candidate(SHEET_A, 0, None, 0), &rules);
        assert!(decision.is_admitted());
    }
}
