// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Global toggles: master gates shared by every trap on every page (§3).

/// Master gates for the trigger engine and detection aura rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobalToggles {
    /// Master gate for C5 (the trigger engine). Default `true`.
    pub triggers_enabled: bool,
    /// Master gate for detection aura rendering.
    pub detection_auras_hidden: bool,
    /// If set, `detection_auras_hidden` expires at this wall-clock time (ms).
    pub detection_auras_hidden_until_ms: Option<u64>,
}

impl Default for GlobalToggles {
    fn default() -> Self {
        Self {
            triggers_enabled: true,
            detection_auras_hidden: false,
            detection_auras_hidden_until_ms: None,
        }
    }
}

impl GlobalToggles {
    /// Whether detection auras are currently hidden, accounting for timer expiry.
    #[must_use]
    pub fn auras_hidden_at(&self, now_ms: u64) -> bool {
        if !self.detection_auras_hidden {
            return false;
        }
        match self.detection_auras_hidden_until_ms {
            Some(until) => now_ms < until,
            None => true,
        }
    }

    /// Re-derives `detection_auras_hidden` against the current time, clearing
    /// it once an expiry timer has passed.
    pub fn expire_auras_hidden(&mut self, now_ms: u64) {
        if let Some(until) = self.detection_auras_hidden_until_ms {
            if now_ms >= until {
                self.detection_auras_hidden = false;
                self.detection_auras_hidden_until_ms = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_expires_and_clears() {
        let mut toggles = GlobalToggles {
            detection_auras_hidden: true,
            detection_auras_hidden_until_ms: Some(1_000),
            ..Default::default()
        };
        assert!(toggles.auras_hidden_at(500));
        toggles.expire_auras_hidden(1_500);
        assert!(!toggles.detection_auras_hidden);
        assert!(!toggles.auras_hidden_at(1_500));
    }

    #[test]
    fn untimed_hide_stays_hidden() {
        let toggles = GlobalToggles {
            detection_auras_hidden: true,
            detection_auras_hidden_until_ms: None,
            ..Default::default()
        };
        assert!(toggles.auras_hidden_at(999_999));
    }
}
