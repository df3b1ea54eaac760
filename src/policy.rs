//! UI control policy derived from the discussion status.

use crate::types::DiscussionStatus;

/// Enablement of the three discussion controls for one status value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    pub start_enabled: bool,
    pub continue_enabled: bool,
    pub stop_enabled: bool,
}

/// Compute control enablement from the current status. Pure and total over
/// all status values, including unrecognized ones. Stop is always available.
pub fn controls_for(status: &DiscussionStatus) -> Controls {
    match status {
        DiscussionStatus::Running => Controls {
            start_enabled: false,
            continue_enabled: true,
            stop_enabled: true,
        },
        DiscussionStatus::Stopped | DiscussionStatus::Completed => Controls {
            start_enabled: true,
            continue_enabled: true,
            stop_enabled: true,
        },
        DiscussionStatus::Pending | DiscussionStatus::Other(_) => Controls {
            start_enabled: true,
            continue_enabled: false,
            stop_enabled: true,
        },
    }
}
