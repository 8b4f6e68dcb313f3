//! Consecutive-sender suppression for the spawn counter.
//!
//! A member posting alone can only push the counter `limit` times in a row; the
//! run resets the moment anyone else speaks, so normal back-and-forth is never
//! penalised.

use super::types::UserId;

/// Per-group throttle state.
///
/// `Absent` means no sender is being tracked, either because the group has never
/// posted or because a spawn cycle just completed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActivityThrottle {
    #[default]
    Absent,
    Tracking { last_sender: UserId, consecutive: u32 },
}

impl ActivityThrottle {
    /// Decide whether a message from `sender` counts toward the spawn counter.
    pub fn admit(&mut self, sender: UserId, limit: u32) -> bool {
        match self {
            ActivityThrottle::Tracking {
                last_sender,
                consecutive,
            } if *last_sender == sender => {
                if *consecutive < limit {
                    *consecutive += 1;
                    true
                } else {
                    false
                }
            }
            _ => {
                *self = ActivityThrottle::Tracking {
                    last_sender: sender,
                    consecutive: 1,
                };
                true
            }
        }
    }

    pub fn reset(&mut self) {
        *self = ActivityThrottle::Absent;
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, ActivityThrottle::Absent)
    }
}
