//! Top-level onboarding flow: intro, then registration, then dashboard

use std::fmt;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum AppStage {
    #[default]
    Intro,
    Registration,
    Dashboard,
}

impl fmt::Display for AppStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AppStage::Intro => "intro",
            AppStage::Registration => "registration",
            AppStage::Dashboard => "dashboard",
        };
        f.write_str(name)
    }
}

/// Stage tracker; only ever moves forward
#[derive(Debug, Clone, Default)]
pub struct OnboardingFlow {
    stage: AppStage,
}

impl OnboardingFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> AppStage {
        self.stage
    }

    /// The intro sequence finished
    pub fn intro_complete(&mut self) -> AppStage {
        self.advance(AppStage::Intro, AppStage::Registration)
    }

    /// The registration form was submitted
    pub fn registration_complete(&mut self) -> AppStage {
        self.advance(AppStage::Registration, AppStage::Dashboard)
    }

    fn advance(&mut self, from: AppStage, to: AppStage) -> AppStage {
        if self.stage == from {
            info!("Onboarding: {} -> {}", from, to);
            self.stage = to;
        } else {
            debug!("Ignoring {} completion while in {}", from, self.stage);
        }
        self.stage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_path() {
        let mut flow = OnboardingFlow::new();
        assert_eq!(flow.stage(), AppStage::Intro);
        assert_eq!(flow.intro_complete(), AppStage::Registration);
        assert_eq!(flow.registration_complete(), AppStage::Dashboard);
    }

    #[test]
    fn test_out_of_order_events_are_ignored() {
        let mut flow = OnboardingFlow::new();
        assert_eq!(flow.registration_complete(), AppStage::Intro);

        flow.intro_complete();
        flow.registration_complete();
        assert_eq!(flow.intro_complete(), AppStage::Dashboard);
    }
}
