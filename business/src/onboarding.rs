//! First-run coachmark walkthrough.
//!
//! The front end keeps the step index between runs and hands it back to
//! [`Onboarding::resume`]; completion is recorded in the user's profile metadata through
//! [`AuthState::complete_onboarding`](crate::auth::AuthState::complete_onboarding).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Top,
    Bottom,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OnboardingStep {
    pub title: &'static str,
    pub description: &'static str,
    /// Control the coachmark points at.
    pub target: &'static str,
    pub placement: Placement,
}

pub const STEPS: [OnboardingStep; 5] = [
    OnboardingStep {
        title: "Start by uploading your photo",
        description: "Click here to add a full-body photo of yourself",
        target: ".semi-circle-right",
        placement: Placement::Left,
    },
    OnboardingStep {
        title: "Upload your first top",
        description: "Add a top to your wardrobe (optional)",
        target: ".file-menu",
        placement: Placement::Bottom,
    },
    OnboardingStep {
        title: "Now upload a bottom",
        description: "Add a bottom or skip to style just one piece",
        target: ".file-menu",
        placement: Placement::Bottom,
    },
    OnboardingStep {
        title: "Click Generate to see yourself in this outfit",
        description: "AI will place the clothes on your photo",
        target: ".generate-button",
        placement: Placement::Top,
    },
    OnboardingStep {
        title: "Save your favorite outfits here",
        description: "Rate and save combinations you love",
        target: ".save-rating-button",
        placement: Placement::Top,
    },
];

/// What the caller must do after an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Now showing this step.
    Step(usize),
    /// Record completion, then call [`Onboarding::finish`].
    Complete,
    Inactive,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Onboarding {
    step: Option<usize>,
}

impl Onboarding {
    /// Picks up where the session left off, or at the first step.
    /// Completed users see nothing.
    pub fn resume(stored: Option<usize>, completed: bool) -> Self {
        if completed {
            return Self::default();
        }
        Self {
            step: Some(stored.filter(|s| *s < STEPS.len()).unwrap_or(0)),
        }
    }

    pub fn step_index(&self) -> Option<usize> {
        self.step
    }

    pub fn current(&self) -> Option<&'static OnboardingStep> {
        self.step.and_then(|i| STEPS.get(i))
    }

    pub fn is_active(&self) -> bool {
        self.step.is_some()
    }

    pub fn next(&mut self) -> Progress {
        match self.step {
            None => {
                self.step = Some(0);
                Progress::Step(0)
            }
            Some(i) if i + 1 >= STEPS.len() => Progress::Complete,
            Some(i) => {
                self.step = Some(i + 1);
                Progress::Step(i + 1)
            }
        }
    }

    pub fn previous(&mut self) -> Progress {
        match self.step {
            None => Progress::Inactive,
            Some(i) => {
                let prev = i.saturating_sub(1);
                self.step = Some(prev);
                Progress::Step(prev)
            }
        }
    }

    pub fn skip(&self) -> Progress {
        if self.is_active() {
            Progress::Complete
        } else {
            Progress::Inactive
        }
    }

    pub fn finish(&mut self) {
        self.step = None;
    }
}
